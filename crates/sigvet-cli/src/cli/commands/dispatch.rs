use super::super::args::*;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Keygen(args) => Ok(super::keygen::cmd_keygen(args)),
        Command::Sign(args) => Ok(super::sign::cmd_sign(args).await),
        Command::Thumbprint(args) => Ok(super::thumbprint::cmd_thumbprint(args)),
        Command::Validate(args) => super::validate::run(args).await,
        Command::Status(args) => super::status::run(args).await,
    }
}
