//! JSON-lines output of the Ookla `speedtest` CLI.
//!
//! Each stdout line is one object tagged by `type`. Only the fields we
//! display are modelled; everything else is ignored by serde.

use serde::Deserialize;

use super::{ProgressKind, RunResult, TestStart};

/// Relative duration of each measured phase, used to derive overall
/// progress from per-phase progress.
const PING_WEIGHT: f64 = 2.0;
const DOWNLOAD_WEIGHT: f64 = 15.0;
const UPLOAD_WEIGHT: f64 = 15.0;
const TOTAL_WEIGHT: f64 = PING_WEIGHT + DOWNLOAD_WEIGHT + UPLOAD_WEIGHT;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Line {
    TestStart {
        #[serde(default)]
        isp: String,
        #[serde(default)]
        interface: Interface,
        #[serde(default)]
        server: Server,
    },
    Ping {
        ping: PingSample,
    },
    Download {
        download: BandwidthSample,
    },
    Upload {
        upload: BandwidthSample,
    },
    Result {
        ping: PingSample,
        download: BandwidthSample,
        upload: BandwidthSample,
        #[serde(default, rename = "packetLoss")]
        packet_loss: Option<f64>,
        #[serde(default)]
        result: Option<ResultLink>,
    },
    Log {
        #[serde(default)]
        level: String,
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Interface {
    #[serde(default, rename = "externalIp")]
    external_ip: String,
}

#[derive(Debug, Default, Deserialize)]
struct Server {
    #[serde(default)]
    name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    host: String,
}

#[derive(Debug, Deserialize)]
struct PingSample {
    #[serde(default)]
    latency: f64,
    #[serde(default)]
    jitter: f64,
    #[serde(default)]
    progress: f64,
}

#[derive(Debug, Deserialize)]
struct BandwidthSample {
    #[serde(default)]
    bandwidth: f64,
    #[serde(default)]
    progress: f64,
}

#[derive(Debug, Deserialize)]
struct ResultLink {
    #[serde(default)]
    url: Option<String>,
}

/// A decoded engine line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Message {
    /// Progress notification for the renderer
    Progress(ProgressKind),
    /// Terminal result of the run
    Result(RunResult),
    /// Engine-reported failure
    Error(String),
    /// Informational or unknown line
    Ignored,
}

/// Decode one line of engine output.
pub(crate) fn parse_line(line: &str) -> Result<Message, serde_json::Error> {
    let line: Line = serde_json::from_str(line)?;

    Ok(match line {
        Line::TestStart { isp, interface, server } => {
            Message::Progress(ProgressKind::TestStart(TestStart {
                isp,
                external_ip: interface.external_ip,
                server_location: server.location,
                server_country: server.country,
                server_name: server.name,
                server_host: server.host,
            }))
        }
        Line::Ping { ping } => Message::Progress(ProgressKind::Ping {
            fraction: ping.progress,
            latency_ms: ping.latency,
        }),
        Line::Download { download } => {
            Message::Progress(ProgressKind::Download {
                fraction: download.progress,
                bandwidth: download.bandwidth,
            })
        }
        Line::Upload { upload } => Message::Progress(ProgressKind::Upload {
            fraction: upload.progress,
            bandwidth: upload.bandwidth,
        }),
        Line::Result { ping, download, upload, packet_loss, result } => {
            Message::Result(RunResult {
                latency_ms: ping.latency,
                jitter_ms: ping.jitter,
                download_bandwidth: download.bandwidth,
                upload_bandwidth: upload.bandwidth,
                packet_loss: packet_loss.unwrap_or(0.0),
                url: result.and_then(|link| link.url),
            })
        }
        Line::Log { level, message } if level.eq_ignore_ascii_case("error") => {
            Message::Error(message)
        }
        Line::Log { .. } | Line::Other => Message::Ignored,
    })
}

/// Overall completion of the run implied by a progress notification.
///
/// Phases run in the order ping, download, upload; finished phases count
/// with their full weight.
pub(crate) fn overall_fraction(kind: &ProgressKind) -> f64 {
    let (done, weight, fraction) = match kind {
        ProgressKind::TestStart(_) => return 0.0,
        ProgressKind::Ping { fraction, .. } => (0.0, PING_WEIGHT, *fraction),
        ProgressKind::Download { fraction, .. } => {
            (PING_WEIGHT, DOWNLOAD_WEIGHT, *fraction)
        }
        ProgressKind::Upload { fraction, .. } => {
            (PING_WEIGHT + DOWNLOAD_WEIGHT, UPLOAD_WEIGHT, *fraction)
        }
    };

    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };

    (done + weight * fraction) / TOTAL_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_START: &str = r#"{"type":"testStart","timestamp":"2024-03-01T10:00:00Z","isp":"Comcast Cable","interface":{"internalIp":"192.168.1.20","name":"en0","macAddr":"AA:BB:CC:DD:EE:FF","isVpn":false,"externalIp":"203.0.113.1"},"server":{"id":1234,"host":"speedtest.example.net","port":8080,"name":"Example Networks","location":"San Francisco, CA","country":"United States","ip":"198.51.100.7"}}"#;

    const RESULT: &str = r#"{"type":"result","timestamp":"2024-03-01T10:00:30Z","ping":{"jitter":1.2,"latency":12.4,"low":11.0,"high":14.0},"download":{"bandwidth":12500000,"bytes":150000000,"elapsed":12000},"upload":{"bandwidth":1250000,"bytes":15000000,"elapsed":10000},"packetLoss":0.5,"isp":"Comcast Cable","result":{"id":"abc","url":"https://www.speedtest.net/result/c/abc","persisted":true}}"#;

    #[test]
    fn test_parse_test_start() {
        let message = parse_line(TEST_START).unwrap();

        assert_eq!(
            message,
            Message::Progress(ProgressKind::TestStart(TestStart {
                isp: "Comcast Cable".to_string(),
                external_ip: "203.0.113.1".to_string(),
                server_location: "San Francisco, CA".to_string(),
                server_country: "United States".to_string(),
                server_name: "Example Networks".to_string(),
                server_host: "speedtest.example.net".to_string(),
            }))
        );
    }

    #[test]
    fn test_parse_ping() {
        let line = r#"{"type":"ping","timestamp":"2024-03-01T10:00:01Z","ping":{"jitter":0.4,"latency":10.2,"progress":0.5}}"#;

        assert_eq!(
            parse_line(line).unwrap(),
            Message::Progress(ProgressKind::Ping { fraction: 0.5, latency_ms: 10.2 })
        );
    }

    #[test]
    fn test_parse_download_and_upload() {
        let download = r#"{"type":"download","download":{"bandwidth":20000000,"bytes":1000,"elapsed":100,"progress":0.3,"latency":{"iqm":20.1}}}"#;
        let upload = r#"{"type":"upload","upload":{"bandwidth":5000000,"bytes":1000,"elapsed":100,"progress":1}}"#;

        assert_eq!(
            parse_line(download).unwrap(),
            Message::Progress(ProgressKind::Download {
                fraction: 0.3,
                bandwidth: 20_000_000.0
            })
        );
        assert_eq!(
            parse_line(upload).unwrap(),
            Message::Progress(ProgressKind::Upload {
                fraction: 1.0,
                bandwidth: 5_000_000.0
            })
        );
    }

    #[test]
    fn test_parse_result() {
        let Message::Result(result) = parse_line(RESULT).unwrap() else {
            panic!("expected a result");
        };

        assert_eq!(result.latency_ms, 12.4);
        assert_eq!(result.jitter_ms, 1.2);
        assert_eq!(result.download_bandwidth, 12_500_000.0);
        assert_eq!(result.upload_bandwidth, 1_250_000.0);
        assert_eq!(result.packet_loss, 0.5);
        assert_eq!(
            result.url.as_deref(),
            Some("https://www.speedtest.net/result/c/abc")
        );
    }

    #[test]
    fn test_parse_result_without_packet_loss() {
        let line = r#"{"type":"result","ping":{"jitter":1,"latency":2},"download":{"bandwidth":3},"upload":{"bandwidth":4}}"#;

        let Message::Result(result) = parse_line(line).unwrap() else {
            panic!("expected a result");
        };
        assert_eq!(result.packet_loss, 0.0);
        assert_eq!(result.url, None);
    }

    #[test]
    fn test_parse_log_lines() {
        let error = r#"{"type":"log","timestamp":"2024-03-01T10:00:00Z","message":"Configuration - Couldn't resolve host name","level":"error"}"#;
        let info = r#"{"type":"log","message":"Server selected","level":"info"}"#;

        assert_eq!(
            parse_line(error).unwrap(),
            Message::Error("Configuration - Couldn't resolve host name".to_string())
        );
        assert_eq!(parse_line(info).unwrap(), Message::Ignored);
    }

    #[test]
    fn test_parse_unknown_type_is_ignored() {
        let line = r#"{"type":"packetLoss","packetLoss":0,"progress":1}"#;

        assert_eq!(parse_line(line).unwrap(), Message::Ignored);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_line("Speedtest by Ookla").is_err());
        assert!(parse_line(r#"{"type":"ping"}"#).is_err());
    }

    #[test]
    fn test_overall_fraction_phase_boundaries() {
        let start = ProgressKind::TestStart(TestStart::default());
        let ping_done = ProgressKind::Ping { fraction: 1.0, latency_ms: 0.0 };
        let download_start = ProgressKind::Download { fraction: 0.0, bandwidth: 0.0 };
        let download_done = ProgressKind::Download { fraction: 1.0, bandwidth: 0.0 };
        let upload_done = ProgressKind::Upload { fraction: 1.0, bandwidth: 0.0 };

        assert_eq!(overall_fraction(&start), 0.0);
        assert_eq!(overall_fraction(&ping_done), overall_fraction(&download_start));
        assert!((overall_fraction(&download_done) - 17.0 / 32.0).abs() < 1e-9);
        assert!((overall_fraction(&upload_done) - 1.0).abs() < 1e-9);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: overall progress stays in [0, 1] and never decreases
        /// when phases advance in engine order.
        #[test]
        fn prop_overall_fraction_monotonic(
            ping in 0.0f64..=1.0,
            download in 0.0f64..=1.0,
            upload in 0.0f64..=1.0
        ) {
            let steps = [
                overall_fraction(&ProgressKind::Ping { fraction: ping, latency_ms: 1.0 }),
                overall_fraction(&ProgressKind::Download { fraction: download, bandwidth: 1.0 }),
                overall_fraction(&ProgressKind::Upload { fraction: upload, bandwidth: 1.0 }),
            ];

            for window in steps.windows(2) {
                prop_assert!(window[0] <= window[1] + 1e-12);
            }
            for step in steps {
                prop_assert!((0.0..=1.0).contains(&step));
            }
        }
    }
}
