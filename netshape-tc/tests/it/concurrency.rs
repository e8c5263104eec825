use std::{sync::Arc, time::Duration};

use netshape_common::{command, CommandSpec, Output, Runner as _};
use netshape_tc::{lock::InterfaceLocks, params::LinkParameters, LinkController};

use crate::helpers::{init_tracing, FakeTc};

const CALLS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_interface_calls_are_serialized() {
    init_tracing();

    let tc = FakeTc::new().with_delay(Duration::from_millis(2));
    let controller = Arc::new(LinkController::new(tc));

    let mut handles = Vec::with_capacity(CALLS);
    for latency in 0..CALLS as u32 {
        let controller = Arc::clone(&controller);
        handles.push(tokio::task::spawn_blocking(move || {
            controller.apply_flat("veth0", &LinkParameters::default().with_latency(latency))
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Without serialization, two calls would probe before either adds, and the second `add`
    // would be rejected.
    let changes = controller.runner().changes();
    assert_eq!(changes.len(), CALLS);
    assert_eq!(changes.iter().filter(|cmd| cmd.starts_with("tc qdisc add")).count(), 1);
    assert_eq!(changes.iter().filter(|cmd| cmd.starts_with("tc qdisc change")).count(), CALLS - 1);
    // Released entries are pruned.
    assert_eq!(controller.locks().active(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_interfaces_are_independent() {
    let tc = FakeTc::new().with_delay(Duration::from_millis(1));
    let controller = Arc::new(LinkController::new(tc));

    let mut handles = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let controller = Arc::clone(&controller);
        handles.push(tokio::task::spawn_blocking(move || {
            let interface = format!("sim{i}");
            let params = LinkParameters::default().with_upload_bandwidth(1_000 * (i as u64 + 1));
            controller.apply_classed(&interface, &params)
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for i in 0..CALLS {
        let interface = format!("sim{i}");
        assert_eq!(controller.runner().root_kind(&interface).as_deref(), Some("htb"));
        assert!(controller.runner().has_class(&interface));
        assert_eq!(controller.runner().filter_count(&interface), 1);
    }
    assert_eq!(controller.locks().active(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn controllers_with_shared_locks_are_serialized() {
    let tc = Arc::new(FakeTc::new().with_delay(Duration::from_millis(2)));
    let locks = Arc::new(InterfaceLocks::new());

    let controller = |tc: Arc<FakeTc>| {
        let runner = move |cmd: &CommandSpec| -> command::Result<Output> { tc.run(cmd) };
        Arc::new(LinkController::new(runner).with_locks(Arc::clone(&locks)))
    };
    let controllers = [controller(Arc::clone(&tc)), controller(Arc::clone(&tc))];

    let mut handles = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let controller = Arc::clone(&controllers[i % 2]);
        handles.push(tokio::task::spawn_blocking(move || {
            controller.apply_flat("veth0", &LinkParameters::default().with_jitter(i as u32))
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Two independent controllers would both probe an uninitialized interface and both `add`.
    let changes = tc.changes();
    assert_eq!(changes.len(), CALLS);
    assert_eq!(changes.iter().filter(|cmd| cmd.starts_with("tc qdisc add")).count(), 1);
    assert!(Arc::ptr_eq(controllers[0].locks(), controllers[1].locks()));
}

#[test]
fn clones_share_locks() {
    let controller = LinkController::system();
    let clone = controller.clone();

    assert!(Arc::ptr_eq(controller.locks(), clone.locks()));
}
