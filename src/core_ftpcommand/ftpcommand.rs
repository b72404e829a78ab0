/// The closed set of commands the honeypot answers. Everything else gets a
/// 502 (or a 530 before login) and is still captured in the event log.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    LIST,
    CWD,
    NOOP,
    MKD,
    RMD,
    DELE,
    RETR,
    STOR,
    PASV,
    WHOAMI,
    HELP,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "PWD" => Some(FtpCommand::PWD),
            "LIST" => Some(FtpCommand::LIST),
            "CWD" => Some(FtpCommand::CWD),
            "NOOP" => Some(FtpCommand::NOOP),
            "MKD" | "XMKD" => Some(FtpCommand::MKD),
            "RMD" | "XRMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "PASV" => Some(FtpCommand::PASV),
            "WHOAMI" => Some(FtpCommand::WHOAMI),
            "HELP" => Some(FtpCommand::HELP),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_and_x_aliases() {
        assert_eq!(FtpCommand::from_str("user"), Some(FtpCommand::USER));
        assert_eq!(FtpCommand::from_str("XMKD"), Some(FtpCommand::MKD));
        assert_eq!(FtpCommand::from_str("xrmd"), Some(FtpCommand::RMD));
        assert_eq!(FtpCommand::from_str("SITE"), None);
    }
}
