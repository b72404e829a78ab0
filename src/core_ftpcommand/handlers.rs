use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::core_log::EventLog;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

// PASV lives with the rest of the data-channel plumbing.
use crate::core_network::pasv;

/// What the connection loop should do after a command completes.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandFlow {
    Continue,
    Disconnect,
}

/// Routes one parsed command line to its handler.
///
/// The command set is a closed enum matched exhaustively, so a new command
/// is a compile-time-checked variant addition. USER and PASS are reachable
/// in every state; everything else requires authentication first and is
/// answered with 530 (and no side effects) until login succeeds.
pub async fn dispatch_command(
    command: &str,
    arg: &str,
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<TokioMutex<Session>>,
    events: Arc<EventLog>,
) -> Result<CommandFlow, std::io::Error> {
    let authenticated = session.lock().await.is_authenticated;

    let cmd = match FtpCommand::from_str(command) {
        Some(cmd) => cmd,
        None => {
            if authenticated {
                send_response(&writer, b"502 Command not implemented\r\n").await?;
            } else {
                send_response(&writer, b"530 Please login with USER and PASS\r\n").await?;
            }
            return Ok(CommandFlow::Continue);
        }
    };

    if !authenticated && !matches!(cmd, FtpCommand::USER | FtpCommand::PASS) {
        send_response(&writer, b"530 Please login with USER and PASS\r\n").await?;
        return Ok(CommandFlow::Continue);
    }

    let arg = arg.to_string();
    match cmd {
        FtpCommand::USER => {
            crate::core_ftpcommand::user::handle_user_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::PASS => {
            crate::core_ftpcommand::pass::handle_pass_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::PWD => {
            crate::core_ftpcommand::pwd::handle_pwd_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::CWD => {
            crate::core_ftpcommand::cwd::handle_cwd_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::PASV => {
            pasv::handle_pasv_command(writer, config, session, events, arg).await?
        }
        FtpCommand::LIST => {
            crate::core_ftpcommand::list::handle_list_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::STOR => {
            crate::core_ftpcommand::stor::handle_stor_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::RETR => {
            crate::core_ftpcommand::retr::handle_retr_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::DELE => {
            crate::core_ftpcommand::dele::handle_dele_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::MKD => {
            crate::core_ftpcommand::mkd::handle_mkd_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::RMD => {
            crate::core_ftpcommand::rmd::handle_rmd_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::NOOP => {
            crate::core_ftpcommand::noop::handle_noop_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::WHOAMI => {
            crate::core_ftpcommand::whoami::handle_whoami_command(
                writer, config, session, events, arg,
            )
            .await?
        }
        FtpCommand::HELP => {
            crate::core_ftpcommand::help::handle_help_command(writer, config, session, events, arg)
                .await?
        }
        FtpCommand::QUIT => {
            crate::core_ftpcommand::quit::handle_quit_command(writer, config, session, events, arg)
                .await?;
            return Ok(CommandFlow::Disconnect);
        }
    }

    Ok(CommandFlow::Continue)
}
