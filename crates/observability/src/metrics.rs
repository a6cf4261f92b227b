//! RSS 传感器指标收集模块
//!
//! 记录每个 tick 的评估结果，并在内存中聚合 RssResponse 统计。

use std::collections::HashMap;

use contracts::{LongitudinalResponse, RssResponse};
use metrics::{counter, gauge, histogram};

/// 记录收到的 tick
pub fn record_tick_received(sensor_id: &str, frame: u64) {
    counter!("carla_rss_ticks_total", "sensor_id" => sensor_id.to_string()).increment(1);
    gauge!("carla_rss_last_frame", "sensor_id" => sensor_id.to_string()).set(frame as f64);
}

/// 记录一次完成的 RSS 评估及其耗时
pub fn record_evaluation(sensor_id: &str, duration_ms: f64, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "carla_rss_evaluations_total",
        "sensor_id" => sensor_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "carla_rss_evaluation_duration_ms",
        "sensor_id" => sensor_id.to_string()
    )
    .record(duration_ms);
}

/// 记录因评估仍在进行而跳过的 tick
pub fn record_tick_skipped(sensor_id: &str) {
    counter!("carla_rss_ticks_skipped_total", "sensor_id" => sensor_id.to_string()).increment(1);
}

/// 记录评估故障
pub fn record_evaluation_fault(sensor_id: &str, kind: &str) {
    counter!(
        "carla_rss_evaluation_faults_total",
        "sensor_id" => sensor_id.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录传感器销毁后到达的 tick
pub fn record_stale_tick() {
    counter!("carla_rss_stale_ticks_total").increment(1);
}

/// 记录发出的响应
pub fn record_response(sensor_id: &str, response: &RssResponse) {
    if response.requires_action() {
        counter!(
            "carla_rss_unsafe_responses_total",
            "sensor_id" => sensor_id.to_string()
        )
        .increment(1);
    }
    gauge!("carla_rss_ego_speed_lon", "sensor_id" => sensor_id.to_string())
        .set(response.ego_velocity.speed_lon);
}

/// 响应指标聚合器
///
/// 在内存中聚合响应，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ResponseMetricsAggregator {
    /// 响应总数
    pub total_responses: u64,

    /// 成功评估的响应数
    pub successful: u64,

    /// 需要制动的响应数
    pub requiring_action: u64,

    /// 纵向响应分布
    pub longitudinal_counts: HashMap<LongitudinalResponse, u64>,

    /// 自车纵向速度统计
    pub ego_speed_stats: RunningStats,

    last_frame: Option<u64>,

    /// 响应之间的帧间隔 (用于检测跳帧)
    pub frame_gap_stats: RunningStats,
}

impl ResponseMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, response: &RssResponse) {
        self.total_responses += 1;
        if response.success {
            self.successful += 1;
            self.ego_speed_stats.push(response.ego_velocity.speed_lon);
        }
        if response.requires_action() {
            self.requiring_action += 1;
        }
        *self
            .longitudinal_counts
            .entry(response.longitudinal_response)
            .or_insert(0) += 1;

        if let Some(last) = self.last_frame {
            self.frame_gap_stats
                .push(response.frame.saturating_sub(last) as f64);
        }
        self.last_frame = Some(response.frame);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_responses: self.total_responses,
            successful: self.successful,
            requiring_action: self.requiring_action,
            success_rate: if self.total_responses > 0 {
                self.successful as f64 / self.total_responses as f64 * 100.0
            } else {
                0.0
            },
            longitudinal_counts: self.longitudinal_counts.clone(),
            ego_speed: StatsSummary::from(&self.ego_speed_stats),
            frame_gap: StatsSummary::from(&self.frame_gap_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_responses: u64,
    pub successful: u64,
    pub requiring_action: u64,
    pub success_rate: f64,
    pub longitudinal_counts: HashMap<LongitudinalResponse, u64>,
    pub ego_speed: StatsSummary,
    pub frame_gap: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== RSS Response Summary ===")?;
        writeln!(f, "Total responses: {}", self.total_responses)?;
        writeln!(
            f,
            "Successful checks: {} ({:.2}%)",
            self.successful, self.success_rate
        )?;
        writeln!(f, "Responses requiring action: {}", self.requiring_action)?;
        writeln!(f, "Ego speed lon (m/s): {}", self.ego_speed)?;
        writeln!(f, "Frame gap: {}", self.frame_gap)?;

        if !self.longitudinal_counts.is_empty() {
            writeln!(f, "Longitudinal responses:")?;
            let mut counts: Vec<_> = self.longitudinal_counts.iter().collect();
            counts.sort_by_key(|(response, _)| format!("{response:?}"));
            for (response, count) in counts {
                writeln!(f, "  {:?}: {}", response, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AccelerationRestriction, EgoVelocity, LateralResponse, Transform};

    fn response(frame: u64, success: bool, lon: LongitudinalResponse) -> RssResponse {
        RssResponse {
            frame,
            elapsed_seconds: frame as f64 * 0.05,
            pose: Transform::default(),
            success,
            longitudinal_response: lon,
            lateral_response_right: LateralResponse::None,
            lateral_response_left: LateralResponse::None,
            acceleration_restriction: AccelerationRestriction::default(),
            ego_velocity: EgoVelocity {
                speed_lon: 10.0,
                speed_lat: 0.0,
            },
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ResponseMetricsAggregator::new();
        aggregator.update(&response(1, true, LongitudinalResponse::None));
        aggregator.update(&response(2, false, LongitudinalResponse::None));
        aggregator.update(&response(4, true, LongitudinalResponse::BrakeMin));

        let summary = aggregator.summary();
        assert_eq!(summary.total_responses, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.requiring_action, 1);
        assert_eq!(summary.longitudinal_counts[&LongitudinalResponse::None], 2);
        assert_eq!(summary.ego_speed.count, 2);
        assert!((summary.frame_gap.max - 2.0).abs() < 1e-10);
        assert!(summary.to_string().contains("Total responses: 3"));
    }

    #[test]
    fn test_aggregator_reset() {
        let mut aggregator = ResponseMetricsAggregator::new();
        aggregator.update(&response(1, true, LongitudinalResponse::None));
        aggregator.reset();
        assert_eq!(aggregator.summary().total_responses, 0);
        assert_eq!(aggregator.summary().success_rate, 0.0);
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls must be no-ops
        record_tick_received("rss", 1);
        record_evaluation("rss", 1.5, true);
        record_tick_skipped("rss");
        record_evaluation_fault("rss", "check_failed");
        record_stale_tick();
        record_response("rss", &response(1, true, LongitudinalResponse::BrakeMin));
    }
}
