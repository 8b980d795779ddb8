use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Findings,
    InvalidArgs,
    AnalysisFailed,
    ExternalCommandFailed,
    ApiFailed,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Findings => 1,
            ExitCode::InvalidArgs => 2,
            ExitCode::AnalysisFailed => 10,
            ExitCode::ExternalCommandFailed => 20,
            ExitCode::ApiFailed => 30,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self { code, err }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err)
    }
}

// The wrapper is transparent: the chain continues with the wrapped error's causes.
impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.source()
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    ExitCode::AnalysisFailed.as_i32()
}

pub fn findings(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::Findings, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, err).into()
}

pub fn analysis_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::AnalysisFailed, err).into()
}

pub fn external_cmd_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::ExternalCommandFailed, err).into()
}

pub fn api(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::ApiFailed, anyhow::anyhow!(message.into())).into()
}

pub fn api_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::ApiFailed, err).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_errors_map_to_their_exit_code() {
        assert_eq!(exit_code(&invalid_args("bad")), 2);
        assert_eq!(exit_code(&external_cmd_err(anyhow::anyhow!("spawn"))), 20);
        assert_eq!(exit_code(&api("status")), 30);
        assert_eq!(exit_code(&findings("found")), 1);
    }

    #[test]
    fn tagging_does_not_repeat_the_message_in_the_chain() {
        let err = analysis_err(anyhow::anyhow!("Unable to find JSON blob"));
        assert_eq!(format!("{err:#}"), "Unable to find JSON blob");

        let err = api_err(anyhow::anyhow!("status 500").context("Failed to list comments"));
        assert_eq!(format!("{err:#}"), "Failed to list comments: status 500");
        assert_eq!(err.chain().count(), 2);
    }

    #[test]
    fn untagged_errors_are_analysis_failures() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 10);
    }

    #[test]
    fn tagging_survives_added_context() {
        use anyhow::Context;

        let err: anyhow::Result<()> = Err(api("Failed to create comment"));
        let err = err.context("Create or update comment").unwrap_err();
        assert_eq!(exit_code(&err), 30);
    }
}
