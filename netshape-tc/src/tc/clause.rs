//! Typed `tc` argument clauses.
//!
//! A clause is one optional run of arguments within a shaping command. Clauses are ordered: the
//! derived [`Ord`] follows declaration order, which is the order netem's grammar expects. Emitting
//! them out of order makes `tc` fail with a parse error.

/// One argument clause of a netem or htb command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Clause {
    /// `delay <ms>ms`
    Delay(u32),
    /// `<ms>ms distribution normal`. Only valid right after [`Clause::Delay`].
    Jitter(u32),
    /// `rate <bit/s>`
    Rate(u64),
    /// `loss <percent>%`
    Loss(u8),
    /// `rate <bit/s> ceil <bit/s>` on an htb class.
    ClassRate(u64),
}

impl Clause {
    /// Appends the clause's arguments to `args`.
    pub fn write_args(self, args: &mut Vec<String>) {
        match self {
            Self::Delay(ms) => {
                args.push("delay".to_string());
                args.push(format!("{ms}ms"));
            }
            Self::Jitter(ms) => {
                args.push(format!("{ms}ms"));
                args.push("distribution".to_string());
                args.push("normal".to_string());
            }
            Self::Rate(rate) => {
                args.push("rate".to_string());
                args.push(rate.to_string());
            }
            Self::Loss(percent) => {
                args.push("loss".to_string());
                args.push(format!("{percent}%"));
            }
            Self::ClassRate(rate) => {
                args.push("rate".to_string());
                args.push(rate.to_string());
                args.push("ceil".to_string());
                args.push(rate.to_string());
            }
        }
    }
}
