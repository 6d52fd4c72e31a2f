//! Zabbix sender (trapper) protocol client.
//!
//! Frame layout: `ZBXD`, flags byte `0x01`, body length as little-endian u64,
//! then the JSON body.

use crate::config::SinkSettings;
use crate::domain::model::{SinkPayload, SinkResponse};
use crate::domain::ports::MetricSink;
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const MAGIC: &[u8; 4] = b"ZBXD";
const FLAG_STANDARD: u8 = 0x01;
const HEADER_LEN: usize = 13;
const MAX_REPLY_LEN: u64 = 16 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: Vec<SenderItem<'a>>,
    clock: i64,
}

#[derive(Debug, Serialize)]
struct SenderItem<'a> {
    host: &'a str,
    key: &'a str,
    value: String,
    clock: i64,
}

#[derive(Debug, Deserialize)]
struct SenderReply {
    response: String,
    #[serde(default)]
    info: String,
}

pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(MAGIC);
    frame.push(FLAG_STANDARD);
    frame.extend_from_slice(&(body.len() as u64).to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    if &header[..4] != MAGIC {
        return Err(MonitorError::SinkError {
            message: "reply does not start with ZBXD".to_string(),
        });
    }
    if header[4] & FLAG_STANDARD == 0 {
        return Err(MonitorError::SinkError {
            message: format!("unsupported protocol flags {:#04x}", header[4]),
        });
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&header[5..]);
    let len = u64::from_le_bytes(len_bytes);
    if len > MAX_REPLY_LEN {
        return Err(MonitorError::SinkError {
            message: format!("reply of {} bytes exceeds limit", len),
        });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Pulls the counters out of `processed: 5; failed: 0; total: 5; seconds spent: 0.000055`.
fn parse_info(info: &str) -> (usize, usize) {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"processed:\s*(\d+);\s*failed:\s*(\d+)").expect("valid regex"));

    pattern
        .captures(info)
        .map(|caps| {
            (
                caps[1].parse().unwrap_or_default(),
                caps[2].parse().unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ZabbixSender {
    server: String,
    port: u16,
    timeout: Duration,
}

impl ZabbixSender {
    pub fn new(settings: &SinkSettings) -> Self {
        Self {
            server: settings.server.clone(),
            port: settings.port,
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }

    fn request_body(payload: &SinkPayload, clock: i64) -> Result<Vec<u8>> {
        let data = payload
            .items()
            .map(|(host, key, value)| SenderItem {
                host,
                key,
                value: value.to_wire_string(),
                clock,
            })
            .collect();

        let request = SenderRequest {
            request: "sender data",
            data,
            clock,
        };
        Ok(serde_json::to_vec(&request)?)
    }

    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let mut stream = TcpStream::connect((self.server.as_str(), self.port)).await?;
        stream.write_all(frame).await?;
        stream.flush().await?;
        read_frame(&mut stream).await
    }
}

#[async_trait]
impl MetricSink for ZabbixSender {
    async fn send(&self, payload: &SinkPayload) -> Result<SinkResponse> {
        let body = Self::request_body(payload, chrono::Utc::now().timestamp())?;
        let frame = encode_frame(&body);

        tracing::debug!(
            "Sending {} items ({} bytes) to {}:{}",
            payload.item_count(),
            frame.len(),
            self.server,
            self.port
        );

        let reply = tokio::time::timeout(self.timeout, self.exchange(&frame))
            .await
            .map_err(|_| MonitorError::SinkError {
                message: format!("no reply from {}:{} within {:?}", self.server, self.port, self.timeout),
            })?
            .map_err(|e| match e {
                MonitorError::IoError(io) => MonitorError::SinkError {
                    message: format!("{}:{}: {}", self.server, self.port, io),
                },
                other => other,
            })?;

        let reply: SenderReply = serde_json::from_slice(&reply)?;
        if reply.response != "success" {
            return Err(MonitorError::SinkError {
                message: format!("server answered '{}': {}", reply.response, reply.info),
            });
        }

        let (processed, failed) = parse_info(&reply.info);
        if failed > 0 {
            tracing::warn!("Zabbix rejected {} of {} items: {}", failed, processed + failed, reply.info);
        } else {
            tracing::info!("📤 Zabbix accepted {} items", processed);
        }

        Ok(SinkResponse {
            processed,
            failed,
            info: reply.info,
        })
    }
}
