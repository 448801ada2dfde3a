/// How a loop iteration or a whole session ended.
///
/// Every exit path of the program resolves to one of these, and
/// [`Outcome::dispatch`] is the only place that turns one into a process
/// exit code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The iteration finished normally; keep looping.
    Continue,
    /// A key was pressed.
    StopRequested,
    /// The camera returned no frame or an empty one.
    CaptureFailed,
    /// Configuration or cascade artifact could not be used.
    ConfigError(String),
    /// The camera could not be opened.
    DeviceUnavailable(String),
    /// The detector or display failed mid-session.
    BackendFailed(String),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Continue | Outcome::StopRequested | Outcome::CaptureFailed => 0,
            Outcome::ConfigError(_) => -1,
            Outcome::DeviceUnavailable(_) | Outcome::BackendFailed(_) => 1,
        }
    }

    /// Writes the diagnostic for failure outcomes to stderr and returns the
    /// exit code.
    pub fn dispatch(&self) -> i32 {
        match self {
            Outcome::Continue | Outcome::StopRequested => {}
            Outcome::CaptureFailed => eprintln!("ERROR: capture returned no frame"),
            Outcome::ConfigError(msg) => {
                eprintln!("ERROR: could not load classifier cascade: {msg}")
            }
            Outcome::DeviceUnavailable(msg) => eprintln!("ERROR: camera unavailable: {msg}"),
            Outcome::BackendFailed(msg) => eprintln!("ERROR: {msg}"),
        }
        self.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Outcome::StopRequested, 0)]
    #[case(Outcome::CaptureFailed, 0)]
    #[case(Outcome::ConfigError("missing".into()), -1)]
    #[case(Outcome::DeviceUnavailable("busy".into()), 1)]
    #[case(Outcome::BackendFailed("window".into()), 1)]
    fn test_exit_codes(#[case] outcome: Outcome, #[case] code: i32) {
        assert_eq!(outcome.exit_code(), code);
        assert_eq!(outcome.dispatch(), code);
    }

    #[test]
    fn test_only_continue_is_non_terminal() {
        assert!(!Outcome::Continue.is_terminal());
        assert!(Outcome::StopRequested.is_terminal());
        assert!(Outcome::CaptureFailed.is_terminal());
        assert!(Outcome::ConfigError(String::new()).is_terminal());
    }
}
