//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需 CARLA）：配置 -> 传感器 -> sinks

#[cfg(test)]
mod contract_tests {
    use contracts::{RssResponse, SafetyVerdict, Timestamp, Transform};
    use rss_sensor::ResponseTranslator;

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_response_json_shape() {
        // sinks 输出的 JSON 字段名是对外合约
        let response: RssResponse = ResponseTranslator::translate(
            &SafetyVerdict::default(),
            &Timestamp::new(7, 0.35),
            Transform::at(1.0, 2.0, 0.0),
        )
        .unwrap();
        let json = serde_json::to_value(&response).unwrap();

        for key in [
            "frame",
            "elapsed_seconds",
            "pose",
            "success",
            "longitudinal_response",
            "lateral_response_right",
            "lateral_response_left",
            "acceleration_restriction",
            "ego_velocity",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
        assert_eq!(json["longitudinal_response"], "none");
        assert_eq!(json["success"], false);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ActorList, ActorSnapshot, DynamicsProfile, EvaluationRequest, LateralResponse,
        LongitudinalResponse, MapContext, ResponseSink, RssResponse, RssSensorBlueprint,
        SafetyEvaluator, Timestamp, Transform,
    };
    use observability::ResponseMetricsAggregator;
    use rss_sensor::{DynamicsStore, ResponseCallback, ResponseTranslator, RssSensor};
    use sim::{KinematicEvaluator, ManualTickSource, MockWorld, ScriptedEvaluator};
    use sinks::{FileSink, FileSinkConfig, SinkFanout};
    use tempfile::tempdir;
    use tokio::runtime::Handle;

    /// Ego at 15 m/s approaching a stopped vehicle 60 m ahead
    fn config_toml(output: &str) -> String {
        format!(
            r#"
[sensor]
id = "rss_e2e"
parent_actor = 1
skip_policy = "emit_default"

[world]
map = "Town04"
tick_interval_ms = 100

[[actors]]
id = 1
type_id = "vehicle.tesla.model3"
[actors.velocity]
x = 15.0
y = 0.0
z = 0.0

[[actors]]
id = 2
type_id = "vehicle.audi.tt"
[actors.transform.location]
x = 60.0
y = 0.0
z = 0.0

[[actors]]
id = 3
type_id = "walker.pedestrian.0001"
[actors.transform.location]
x = 5.0
y = 0.0
z = 0.0

[[sinks]]
name = "jsonl"
sink_type = "file"
[sinks.params]
path = "{output}"
"#
        )
    }

    struct Pipeline {
        world: Arc<MockWorld>,
        ticks: Arc<ManualTickSource>,
        sensor: RssSensor,
        fanout: Arc<SinkFanout>,
        aggregator: Arc<Mutex<ResponseMetricsAggregator>>,
    }

    impl Pipeline {
        fn build(blueprint: &RssSensorBlueprint, checker: Arc<dyn SafetyEvaluator>) -> Self {
            let world = Arc::new(MockWorld::from_blueprint(blueprint));
            let ticks = Arc::new(ManualTickSource::with_episode(blueprint.world.episode_id));
            let sensor = RssSensor::with_dynamics(
                blueprint.sensor.clone(),
                DynamicsStore::from_config(&blueprint.dynamics),
                world.clone(),
                ticks.clone(),
                checker,
            );
            let fanout =
                Arc::new(SinkFanout::from_configs(&Handle::current(), &blueprint.sinks).unwrap());

            Self {
                world,
                ticks,
                sensor,
                fanout,
                aggregator: Arc::new(Mutex::new(ResponseMetricsAggregator::new())),
            }
        }

        fn callback(&self) -> ResponseCallback {
            let fanout = Arc::clone(&self.fanout);
            let aggregator = Arc::clone(&self.aggregator);
            Arc::new(move |response: RssResponse| {
                aggregator.lock().unwrap().update(&response);
                fanout.publish(&response);
            })
        }

        /// Advance the world and fire one tick, like the simulator does
        fn tick(&self, delta_seconds: f64) {
            self.world.advance(delta_seconds);
            self.ticks.step(delta_seconds);
        }

        async fn finish(self) -> ResponseMetricsAggregator {
            self.sensor.stop();
            drop(self.sensor);
            let aggregator = self.aggregator.lock().unwrap().clone();
            let fanout = Arc::try_unwrap(self.fanout)
                .unwrap_or_else(|_| panic!("fan-out still referenced after stop"));
            fanout.shutdown().await;
            aggregator
        }
    }

    fn read_responses(path: &std::path::Path) -> Vec<RssResponse> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// End-to-end: config -> MockWorld + ticks -> RssSensor -> file sink
    ///
    /// 验证完整的数据流：
    /// 1. ConfigLoader 解析并验证 TOML
    /// 2. 每个 tick 产生恰好一个响应，帧号递增
    /// 3. 自车接近静止车辆后出现制动响应
    #[tokio::test]
    async fn test_e2e_config_to_file_sink() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("responses.jsonl");
        let blueprint = ConfigLoader::load_from_str(
            &config_toml(&output.display().to_string()),
            ConfigFormat::Toml,
        )
        .unwrap();

        let pipeline = Pipeline::build(&blueprint, Arc::new(KinematicEvaluator::new()));
        pipeline.sensor.listen(pipeline.callback()).unwrap();

        let delta = blueprint.tick_interval_secs();
        for _ in 0..30 {
            pipeline.tick(delta);
        }
        let stats = pipeline.sensor.stats();
        let aggregator = pipeline.finish().await;

        assert_eq!(stats.ticks, 30);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.faulted, 0);
        assert_eq!(aggregator.total_responses, 30);

        let responses = read_responses(&output);
        assert_eq!(responses.len(), 30);
        let frames: Vec<u64> = responses.iter().map(|r| r.frame).collect();
        assert_eq!(frames, (1..=30).collect::<Vec<_>>());
        assert!(responses.iter().all(|r| r.success));

        // Far away at first, closing at 15 m/s: needs to brake well before contact
        assert_eq!(
            responses[0].longitudinal_response,
            LongitudinalResponse::None
        );
        let last = responses.last().unwrap();
        assert_eq!(last.longitudinal_response, LongitudinalResponse::BrakeMin);
        assert!(last.pose.location.x > 40.0);
        assert!((last.ego_velocity.speed_lon - 15.0).abs() < 1e-9);
    }

    /// 运动学检查的响应（含横向制动）写入 FileSink 后可原样读回
    #[tokio::test]
    async fn test_kinematic_response_reads_back_from_file_sink() {
        let world = MockWorld::new("Town04");
        let mut ego = ActorSnapshot::new(1, "vehicle.tesla.model3", Transform::at(0.0, 0.0, 0.0));
        ego.velocity.x = 10.0;
        let mut other = ActorSnapshot::new(2, "vehicle.audi.tt", Transform::at(1.0, -2.1, 0.0));
        other.velocity.x = 10.0;
        let actors = ActorList::new(vec![ego, other]);
        let map = MapContext::new("Town04");
        let ego_dynamics = DynamicsProfile::default_ego();
        let other_dynamics = DynamicsProfile::default_other();
        let timestamp = Timestamp::new(3, 0.15);
        let request = EvaluationRequest {
            timestamp,
            world: &world,
            actors: &actors,
            ego: 1,
            map: &map,
            ego_dynamics: &ego_dynamics,
            other_dynamics: &other_dynamics,
            visualize_results: false,
        };

        let verdict = KinematicEvaluator::new().check_objects(&request).unwrap();
        let response =
            ResponseTranslator::translate(&verdict, &timestamp, Transform::at(0.0, 0.0, 0.0))
                .unwrap();
        assert_eq!(response.lateral_response_left, LateralResponse::BrakeMin);

        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("kinematic.jsonl"),
            append: false,
        };
        let mut sink = FileSink::new("file", config.clone()).unwrap();
        sink.write(&response).await.unwrap();
        sink.close().await.unwrap();

        let responses = read_responses(&config.path);
        assert_eq!(responses, vec![response]);
    }

    /// 仿真线程并发 tick 时不阻塞、不重叠，每个 tick 恰好一个响应
    #[tokio::test]
    async fn test_e2e_overlapping_ticks_are_skipped() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("responses.jsonl");
        let blueprint = ConfigLoader::load_from_str(
            &config_toml(&output.display().to_string()),
            ConfigFormat::Toml,
        )
        .unwrap();

        let checker = Arc::new(ScriptedEvaluator::new());
        let gate = checker.hold_next();
        let pipeline = Pipeline::build(&blueprint, checker.clone());
        pipeline.sensor.listen(pipeline.callback()).unwrap();

        let handlers = pipeline.ticks.handlers();
        assert_eq!(handlers.len(), 1);
        let held = {
            let handler = handlers[0].clone();
            thread::spawn(move || {
                handler(&contracts::WorldSnapshot::new(
                    0,
                    contracts::Timestamp::new(1, 0.1),
                ))
            })
        };
        gate.wait_entered();

        // Held check in flight: these ticks return immediately
        pipeline.ticks.fire(contracts::Timestamp::new(2, 0.2));
        pipeline.ticks.fire(contracts::Timestamp::new(3, 0.3));
        gate.release();
        held.join().unwrap();
        pipeline.ticks.fire(contracts::Timestamp::new(4, 0.4));
        drop(handlers);

        let stats = pipeline.sensor.stats();
        pipeline.finish().await;

        assert_eq!(checker.max_in_flight(), 1);
        assert_eq!(checker.call_count(), 2);
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.skipped, 2);

        let responses = read_responses(&output);
        let mut frames: Vec<u64> = responses.iter().map(|r| r.frame).collect();
        frames.sort_unstable();
        assert_eq!(frames, vec![1, 2, 3, 4]);
        for response in responses.iter().filter(|r| r.frame == 2 || r.frame == 3) {
            assert!(!response.success);
            assert!(!response.requires_action());
        }
    }

    /// 仅检查 actor_filter 匹配的 actor
    #[tokio::test]
    async fn test_e2e_actor_filter_reaches_evaluator() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("responses.jsonl");
        let blueprint = ConfigLoader::load_from_str(
            &config_toml(&output.display().to_string()),
            ConfigFormat::Toml,
        )
        .unwrap();

        let checker = Arc::new(ScriptedEvaluator::new());
        let pipeline = Pipeline::build(&blueprint, checker.clone());
        pipeline.sensor.listen(pipeline.callback()).unwrap();
        pipeline.tick(0.1);
        pipeline.finish().await;

        let calls = checker.calls();
        assert_eq!(calls.len(), 1);
        // Pedestrian 3 is filtered out by "vehicle.*"
        assert_eq!(calls[0].actor_ids, vec![1, 2]);
        assert_eq!(calls[0].map, "Town04");
        assert_eq!(calls[0].ego, 1);
    }

    /// stop 之后后台 tick 不再产生响应；drop 后订阅被移除
    #[tokio::test]
    async fn test_e2e_stop_with_background_ticker() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("responses.jsonl");
        let blueprint = ConfigLoader::load_from_str(
            &config_toml(&output.display().to_string()),
            ConfigFormat::Toml,
        )
        .unwrap();

        let checker = Arc::new(ScriptedEvaluator::new());
        checker.set_delay(Some(Duration::from_millis(2)));
        let pipeline = Pipeline::build(&blueprint, checker.clone());
        pipeline.sensor.listen(pipeline.callback()).unwrap();

        let ticker = pipeline.ticks.spawn_ticker(Duration::from_millis(1), 0.1);
        while checker.call_count() < 5 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        pipeline.sensor.stop();
        let emitted_at_stop = pipeline.sensor.stats().emitted;
        let calls_at_stop = checker.call_count();
        tokio::time::sleep(Duration::from_millis(20)).await;
        ticker.stop();

        assert_eq!(checker.call_count(), calls_at_stop);
        assert_eq!(pipeline.sensor.stats().emitted, emitted_at_stop);
        assert_eq!(pipeline.ticks.subscription_count(), 0);

        let aggregator = pipeline.finish().await;
        assert_eq!(aggregator.total_responses, emitted_at_stop);
        assert_eq!(read_responses(&output).len() as u64, emitted_at_stop);
    }

    #[test]
    fn test_config_round_trip_keeps_session_settings() {
        let blueprint = ConfigLoader::load_from_str(
            &config_toml("/tmp/rss_round_trip.jsonl"),
            ConfigFormat::Toml,
        )
        .unwrap();

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.sensor.parent_actor, Some(1));
        assert_eq!(reloaded.actors.len(), 3);
        assert_eq!(reloaded.dynamics.ego, blueprint.dynamics.ego);

        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(reloaded.sinks[0].name, "jsonl");
    }
}
