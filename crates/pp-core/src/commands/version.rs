use serde::Serialize;

use crate::exit_codes::ExitCode;
use crate::output::Report;

#[derive(Debug, Serialize)]
pub struct VersionReport {
    pub name: &'static str,
    pub version: &'static str,
    pub rust_version: &'static str,
}

impl VersionReport {
    pub fn current() -> Self {
        VersionReport {
            name: "photopi",
            version: env!("CARGO_PKG_VERSION"),
            rust_version: env!("CARGO_PKG_RUST_VERSION"),
        }
    }
}

impl Report for VersionReport {
    fn command(&self) -> &'static str {
        "version"
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::Clean
    }

    fn summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }

    fn markdown(&self) -> String {
        format!("{} {}\nrust version: {}\n", self.name, self.version, self.rust_version)
    }
}
