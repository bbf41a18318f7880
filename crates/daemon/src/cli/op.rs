use std::fmt::Display;
use std::path::PathBuf;

/// Inputs shared by every subcommand
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    /// Config directory override; `None` means ~/.feedback
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }
}

/// A subcommand. Its output is printed to stdout on success.
#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: Display + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Declares the top-level `Command` subcommand enum and dispatches each
///  variant to its `Op`, flattening outputs to text.
#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum CommandError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        impl Command {
            pub async fn run(&self, ctx: &$crate::cli::op::OpContext) -> Result<String, CommandError> {
                use $crate::cli::op::Op as _;

                match self {
                    $(
                        Command::$variant(op) => op
                            .execute(ctx)
                            .await
                            .map(|output| output.to_string())
                            .map_err(CommandError::$variant),
                    )*
                }
            }
        }
    };
}
