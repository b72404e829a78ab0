use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_port: u16,
    /// Address advertised in the 227 passive-mode reply. Must be dotted
    /// IPv4; the data listener binds to it as well.
    pub pasv_address: String,
    pub log_file: String,
    pub report_file: String,
    /// Seconds between analysis passes over the event log.
    pub analysis_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Failed logins inside the window that flag a client as brute forcing.
    pub bf_threshold: usize,
    /// Sliding window width for brute-force detection, in minutes.
    pub bf_window_mins: i64,
    /// Failed CWD attempts that flag a client as probing for directories.
    pub dt_threshold: usize,
    /// Completed listings that flag a client as enumerating.
    pub lst_threshold: usize,
    /// Combined MKD/RMD operations that flag a client as tampering.
    pub tamper_threshold: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: 2121,
            pasv_address: String::from("127.0.0.1"),
            log_file: String::from("logs/honeypot_log.json"),
            report_file: String::from("logs/analysis_report.json"),
            analysis_interval_secs: 300,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            bf_threshold: 5,
            bf_window_mins: 5,
            dt_threshold: 10,
            lst_threshold: 20,
            tamper_threshold: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.detection.bf_threshold, 5);
        assert_eq!(config.detection.tamper_threshold, 5);
    }

    #[test]
    fn test_partial_section_override() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_port = 21

            [detection]
            lst_threshold = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_port, 21);
        assert_eq!(config.server.pasv_address, "127.0.0.1");
        assert_eq!(config.detection.lst_threshold, 3);
        assert_eq!(config.detection.dt_threshold, 10);
    }
}
