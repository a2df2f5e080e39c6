//! gpsd 客户端
//!
//! 连接本地 gpsd，开启 JSON watch，返回第一条带坐标的 TPV 报告。
//! 不设内部超时，等待时长由调用方的 acquisition budget 决定。

use contracts::{GeoFix, SensorFault, SensorKind};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::trace;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// TPV 报告中 mode >= 2 才带有效坐标 (2D / 3D fix)
const MIN_FIX_MODE: u8 = 2;

/// gpsd 报告，只取定位相关字段
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    /// 水平误差估计 (m)
    eph: Option<f64>,
    epx: Option<f64>,
    epy: Option<f64>,
}

impl Report {
    fn fix(&self, fallback_accuracy: f64) -> Option<GeoFix> {
        if self.class != "TPV" || self.mode < MIN_FIX_MODE {
            return None;
        }

        let accuracy = self
            .eph
            .or(match (self.epx, self.epy) {
                (Some(x), Some(y)) => Some(x.max(y)),
                (x, y) => x.or(y),
            })
            .unwrap_or(fallback_accuracy);

        Some(GeoFix {
            latitude: self.lat?,
            longitude: self.lon?,
            accuracy,
        })
    }
}

/// Query one fix from the gpsd daemon at `addr`
///
/// `fallback_accuracy` is reported when gpsd gives no error estimate.
pub async fn query_fix(addr: &str, fallback_accuracy: f64) -> Result<GeoFix, SensorFault> {
    let kind = SensorKind::Geolocation;

    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| SensorFault::unavailable(kind, format!("gpsd at {addr}: {e}")))?;
    let (reader, mut writer) = stream.into_split();

    writer
        .write_all(WATCH_COMMAND)
        .await
        .map_err(|e| SensorFault::read_failed(kind, format!("gpsd watch: {e}")))?;

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| SensorFault::read_failed(kind, format!("gpsd read: {e}")))?
    {
        match serde_json::from_str::<Report>(&line) {
            Ok(report) => match report.fix(fallback_accuracy) {
                Some(fix) => return Ok(fix),
                None => trace!(class = %report.class, mode = report.mode, "gpsd report skipped"),
            },
            Err(e) => trace!(error = %e, "unparseable gpsd line"),
        }
    }

    Err(SensorFault::read_failed(
        kind,
        "gpsd closed the connection before a fix",
    ))
}
