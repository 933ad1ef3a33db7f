//! Process exit codes.

use judgeline_core::{ConfigError, RegistryError};
use judgeline_remote::RemoteError;

pub const SUCCESS: i32 = 0;
pub const RUNTIME_ERROR: i32 = 1; // Transport failure, failed judge run
pub const CONFIG_ERROR: i32 = 2; // Bad or missing configuration, rejected credentials

/// Map a command error to an exit code by looking through its causes.
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<ConfigError>() || cause.is::<RegistryError>() {
            return CONFIG_ERROR;
        }
        if let Some(remote) = cause.downcast_ref::<RemoteError>() {
            return remote.exit_code();
        }
    }
    RUNTIME_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn config_errors_map_through_context() {
        let err = Err::<(), _>(ConfigError("serverAddr not set".into()))
            .context("failed to start daemon")
            .unwrap_err();
        assert_eq!(for_error(&err), CONFIG_ERROR);
    }

    #[test]
    fn remote_errors_use_their_own_code() {
        let err = anyhow::Error::new(RemoteError::Unauthorized {
            message: "bad runner key".into(),
        });
        assert_eq!(for_error(&err), CONFIG_ERROR);

        let err = anyhow::Error::new(RemoteError::Network {
            message: "connection refused".into(),
        });
        assert_eq!(for_error(&err), RUNTIME_ERROR);
    }

    #[test]
    fn anything_else_is_a_runtime_error() {
        assert_eq!(for_error(&anyhow::anyhow!("boom")), RUNTIME_ERROR);
    }
}
