//! Built-in adapters shipped with the `judgeline` binary.
//!
//! | name    | kind     | what it does                                     |
//! |---------|----------|--------------------------------------------------|
//! | `dummy` | judge    | accepts everything, echoes `ping`                |
//! | `glue`  | judge    | runs a command or bash script in a sandbox       |
//! | `deno`  | judge    | runs a Deno script against unpacked archives     |
//! | `flag`  | judge    | compares `answer.json` with a configured flag    |
//! | `shell` | instance | runs start/destroy scripts in the instance dir   |

pub mod archive;
#[cfg(unix)]
pub mod deno;
pub mod dummy;
pub mod flag;
#[cfg(unix)]
pub mod glue;
#[cfg(unix)]
pub mod shell;

use judgeline_core::{AdapterRegistry, RegistryError};
use judgeline_remote::StorageLayout;

pub use dummy::DummyAdapter;
pub use flag::FlagAdapter;
#[cfg(unix)]
pub use {deno::DenoAdapter, glue::GlueAdapter, shell::ShellInstancer};

/// Registry holding every built-in adapter. Subprocess adapters put their
/// scratch directories under `storage`'s `tmp/`.
pub fn builtin_registry(storage: &StorageLayout) -> Result<AdapterRegistry, RegistryError> {
    let builder = AdapterRegistry::builder()
        .judge(DummyAdapter)?
        .judge(FlagAdapter::new(storage.clone()))?;

    #[cfg(unix)]
    let builder = builder
        .judge(GlueAdapter::new(storage.clone()))?
        .judge(DenoAdapter::new(storage.clone()))?
        .instancer(ShellInstancer)?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageLayout::new(dir.path()).unwrap();
        let registry = builtin_registry(&storage).unwrap();

        let mut judges: Vec<_> = registry.judge_names().collect();
        judges.sort_unstable();
        assert_eq!(judges, ["deno", "dummy", "flag", "glue"]);
        assert!(registry.instancer("shell").is_some());
        assert!(registry.judge("shell").is_none());
    }
}
