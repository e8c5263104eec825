mod concurrency;

/// Helper types.
mod helpers {
    use std::{os::unix::process::ExitStatusExt as _, process::ExitStatus, time::Duration};

    use netshape_common::{command, CommandSpec, Output, Runner};
    use parking_lot::Mutex;

    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn output(code: i32, stdout: String, stderr: &str) -> Output {
        Output { status: ExitStatus::from_raw(code << 8), stdout, stderr: stderr.to_string() }
    }

    #[derive(Debug, Default)]
    struct State {
        /// Root qdiscs as `(interface, kind)`.
        qdiscs: Vec<(String, String)>,
        /// HTB classes as `(interface, classid)`.
        classes: Vec<(String, String)>,
        /// Interface of every attached filter, in attachment order.
        filters: Vec<String>,
        /// Every command received, in order.
        log: Vec<CommandSpec>,
        /// Commands whose rendered form contains one of these fail once.
        fail_once: Vec<String>,
    }

    /// An in-memory stand-in for `tc`, enforcing the add/change rules of the kernel.
    #[derive(Debug, Default)]
    pub struct FakeTc {
        state: Mutex<State>,
        delay: Option<Duration>,
    }

    impl FakeTc {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sleep on every command, widening race windows.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// The next command containing `needle` fails with a non-zero status.
        pub fn fail_once(&self, needle: &str) {
            self.state.lock().fail_once.push(needle.to_string());
        }

        /// Pretends `interface` already has a `kind` root qdisc.
        pub fn seed_qdisc(&self, interface: &str, kind: &str) {
            self.state.lock().qdiscs.push((interface.to_string(), kind.to_string()));
        }

        pub fn log(&self) -> Vec<String> {
            self.state.lock().log.iter().map(ToString::to_string).collect()
        }

        /// The log without the `tc qdisc show` and `tc class show` listings.
        pub fn changes(&self) -> Vec<String> {
            let state = self.state.lock();
            state
                .log
                .iter()
                .filter(|cmd| cmd.get_args().get(1).map(String::as_str) != Some("show"))
                .map(ToString::to_string)
                .collect()
        }

        pub fn clear_log(&self) {
            self.state.lock().log.clear();
        }

        pub fn root_kind(&self, interface: &str) -> Option<String> {
            let state = self.state.lock();
            state.qdiscs.iter().find(|(i, _)| i == interface).map(|(_, kind)| kind.clone())
        }

        pub fn has_class(&self, interface: &str) -> bool {
            self.state.lock().classes.iter().any(|(i, _)| i == interface)
        }

        pub fn filter_count(&self, interface: &str) -> usize {
            self.state.lock().filters.iter().filter(|i| *i == interface).count()
        }
    }

    impl Runner for FakeTc {
        fn run(&self, cmd: &CommandSpec) -> command::Result<Output> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }

            let mut state = self.state.lock();
            state.log.push(cmd.clone());

            let rendered = cmd.to_string();
            if let Some(pos) = state.fail_once.iter().position(|n| rendered.contains(n.as_str())) {
                state.fail_once.remove(pos);
                let failure = output(2, String::new(), "Error: injected failure.");
                return Err(command::Error::NonZero(failure));
            }

            let args: Vec<&str> = cmd.get_args().iter().map(String::as_str).collect();
            let exists = |msg: &str| Err(command::Error::NonZero(output(2, String::new(), msg)));

            match args.as_slice() {
                ["qdisc", "show"] => {
                    let listing = state
                        .qdiscs
                        .iter()
                        .enumerate()
                        .map(|(i, (iface, kind))| {
                            format!("qdisc {kind} {:x}: dev {iface} root refcnt 2\n", 0x8001 + i)
                        })
                        .collect();
                    Ok(output(0, listing, ""))
                }
                ["class", "show", "dev", iface] => {
                    let listing = state
                        .classes
                        .iter()
                        .filter(|(i, _)| i == iface)
                        .map(|(_, classid)| {
                            format!("class htb {classid} root prio 0 rate 1Mbit ceil 1Mbit\n")
                        })
                        .collect();
                    Ok(output(0, listing, ""))
                }
                ["qdisc", verb, "dev", iface, "root", rest @ ..] => {
                    let kind = if rest.contains(&"htb") { "htb" } else { "netem" };
                    let current = state.qdiscs.iter().position(|(i, _)| i == iface);
                    match (*verb, current) {
                        ("add", Some(_)) => exists("Error: Exclusivity flag on, cannot modify."),
                        ("add", None) => {
                            state.qdiscs.push((iface.to_string(), kind.to_string()));
                            Ok(output(0, String::new(), ""))
                        }
                        ("change", Some(pos)) if state.qdiscs[pos].1 == kind => {
                            Ok(output(0, String::new(), ""))
                        }
                        ("del", Some(pos)) => {
                            state.qdiscs.remove(pos);
                            state.classes.retain(|(i, _)| i != iface);
                            state.filters.retain(|i| i != iface);
                            Ok(output(0, String::new(), ""))
                        }
                        _ => exists("RTNETLINK answers: No such file or directory"),
                    }
                }
                ["class", verb, "dev", iface, "parent", "1:", "classid", classid, "htb", ..] => {
                    let has_root =
                        state.qdiscs.iter().any(|(i, kind)| i == iface && kind == "htb");
                    let current = state.classes.iter().any(|(i, c)| i == iface && c == classid);
                    match (*verb, has_root, current) {
                        ("add", true, false) => {
                            state.classes.push((iface.to_string(), classid.to_string()));
                            Ok(output(0, String::new(), ""))
                        }
                        ("change", true, true) => Ok(output(0, String::new(), "")),
                        ("add", true, true) => exists("RTNETLINK answers: File exists"),
                        _ => exists("RTNETLINK answers: No such file or directory"),
                    }
                }
                ["filter", "add", "dev", iface, ..] => {
                    if !state.qdiscs.iter().any(|(i, kind)| i == iface && kind == "htb") {
                        return exists("Error: Parent Qdisc doesn't exists.");
                    }
                    state.filters.push(iface.to_string());
                    Ok(output(0, String::new(), ""))
                }
                _ => exists("Command line is not complete. Try option \"help\""),
            }
        }
    }
}
