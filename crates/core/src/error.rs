use thiserror::Error;

use crate::model::{ExamConfigError, MaterialError, ModeParseError, ProgressError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    ExamConfig(#[from] ExamConfigError),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Mode(#[from] ModeParseError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExamConfigDraft, Mode};

    fn parse_mode_and_config(mode: &str, minutes: u32) -> Result<Mode, Error> {
        let mode = mode.parse::<Mode>()?;
        ExamConfigDraft {
            time_constraints: Some(minutes),
            ..ExamConfigDraft::default()
        }
        .validate()?;
        Ok(mode)
    }

    #[test]
    fn domain_errors_convert() {
        assert_eq!(parse_mode_and_config("quiz", 30).unwrap(), Mode::Quiz);
        assert!(matches!(parse_mode_and_config("exam", 30), Err(Error::Mode(_))));
        assert!(matches!(
            parse_mode_and_config("review", 0),
            Err(Error::ExamConfig(_))
        ));
    }
}
