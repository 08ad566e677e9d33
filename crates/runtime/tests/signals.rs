mod common;

use common::{Behavior, Marker, TestNode, runtime_with, runtime_with_config};
use serde_json::json;
use trellis_runtime::{CacheMode, CachePolicy, ElementId, FireReport, LibraryConfig, RuntimeConfig, TagType};

fn listeners(patterns: &[&'static str]) -> (trellis_runtime::Runtime, Vec<ElementId>) {
	listeners_with(RuntimeConfig::default(), patterns)
}

fn listeners_with(config: RuntimeConfig, patterns: &[&'static str]) -> (trellis_runtime::Runtime, Vec<ElementId>) {
	let (mut runtime, libs) = runtime_with_config(config, &[("app", 0)]);
	let lib = libs[0];
	let root = TestNode::new(lib, 0, Behavior::Root)
		.with_children(
			patterns
				.iter()
				.zip(1..)
				.map(|(&p, i)| TestNode::new(lib, i, Behavior::Listen(p)).label(p).into_ref()),
		)
		.into_ref();
	let doc = runtime.add_document(lib, "app.xml", root).unwrap();
	assert!(runtime.build(&[doc]).success);
	let ids = runtime.elements().iter().skip(1).map(|(id, _)| id).collect();
	(runtime, ids)
}

#[test]
fn subscriptions_made_during_build_receive_signals() {
	let (runtime, ids) = listeners(&["user.*", "user.created", "order.*"]);

	let mut seen = Vec::new();
	let report = runtime.fire("user.created", None, json!({ "id": 42 }), |id, element, signal| {
		let marker = element.downcast_ref::<Marker>().ok_or("not a marker")?;
		assert_eq!(signal.payload["id"], 42);
		assert_eq!(signal.name, "user.created");
		seen.push((id, marker.label.clone()));
		Ok::<_, &str>(())
	});

	assert_eq!(report, FireReport { delivered: 2, failed: 0 });
	assert_eq!(
		seen,
		[(ids[0], "user.*".to_owned()), (ids[1], "user.created".to_owned())]
	);
}

#[test]
fn wildcard_requires_exact_token_count() {
	let (runtime, _) = listeners(&["a.*.c"]);
	let count = |signal: &str| {
		runtime
			.fire(signal, None, json!(null), |_, _, _| Ok::<_, String>(()))
			.delivered
	};
	assert_eq!(count("a.b.c"), 1);
	assert_eq!(count("a.x.c"), 1);
	assert_eq!(count("a.b.c.d"), 0);
	assert_eq!(count("a.c"), 0);
}

#[test]
fn failing_handler_does_not_stop_delivery() {
	let (runtime, ids) = listeners(&["job.done", "job.*", "job.done"]);

	let mut delivered = Vec::new();
	let report = runtime.fire("job.done", Some("worker"), json!("ok"), |id, _, _| {
		if id == ids[1] {
			return Err(format!("{id} refused"));
		}
		if id == ids[2] {
			panic!("handler exploded");
		}
		delivered.push(id);
		Ok(())
	});

	assert_eq!(report.delivered, 1);
	assert_eq!(report.failed, 2);
	assert_eq!(delivered, [ids[0]]);
}

#[test]
fn repeated_fire_hits_the_route_cache() {
	let (runtime, _) = listeners(&["tick"]);
	let scans = runtime.signals().scan_count();
	for _ in 0..5 {
		runtime.fire("tick", None, json!(1), |_, _, _| Ok::<_, String>(()));
	}
	assert_eq!(runtime.signals().scan_count(), scans + 1);
}

#[test]
fn disabled_cache_from_config_scans_every_time() {
	let mut config = RuntimeConfig::default();
	config.signals.cache = CacheMode::Disabled;
	config.signals.log = true;
	let (runtime, _) = listeners_with(config, &["tick"]);
	for _ in 0..3 {
		runtime.fire("tick", None, json!(1), |_, _, _| Ok::<_, String>(()));
	}
	assert_eq!(runtime.signals().scan_count(), 3);
}

#[test]
fn fire_without_subscribers_delivers_nothing() {
	let (runtime, _) = runtime_with(&[("app", 0)]);
	let report = runtime.fire("nobody.listens", None, json!({}), |_, _, _| Ok::<_, String>(()));
	assert_eq!(report, FireReport::default());
}

#[test]
fn set_config_before_subscriptions_applies_everything() {
	let (mut runtime, ids) = runtime_with(&[("app", 0)]);
	let mut config = RuntimeConfig::default();
	config.signals.cache = CacheMode::Disabled;
	config.build.suggestion_distance = 5;
	config.libraries.insert("app".into(), LibraryConfig { priority: Some(7) });

	runtime.set_config(config.clone());

	assert_eq!(runtime.signals().policy(), CachePolicy::Disabled);
	assert_eq!(runtime.registry().suggestion_distance(), 5);
	assert_eq!(runtime.library(ids[0]).unwrap().priority(), 7);
	assert_eq!(runtime.config(), &config);
}

#[test]
fn set_config_keeps_cache_policy_once_handlers_exist() {
	let (mut runtime, _) = listeners(&["tick"]);
	let mut config = RuntimeConfig::default();
	config.signals.cache = CacheMode::Disabled;

	runtime.set_config(config);

	assert_eq!(runtime.config().signals.cache, CacheMode::Disabled);
	assert_eq!(runtime.signals().policy(), CachePolicy::InvalidateOnRegister);
	assert_eq!(runtime.signals().len(), 1);
}

#[test]
fn handlers_see_elements_changed_after_build() {
	let (mut runtime, ids) = listeners(&["tick"]);
	let element = runtime.element_mut(ids[0]).unwrap();
	element.downcast_mut::<Marker>().unwrap().label = "renamed".into();
	assert!(runtime.registry_mut().unregister(&TagType::local("listener")).is_some());

	let mut labels = Vec::new();
	runtime.fire("tick", None, json!(null), |_, element, _| {
		labels.push(element.downcast_ref::<Marker>().map(|m| m.label.clone()));
		Ok::<_, String>(())
	});

	assert_eq!(labels, [Some("renamed".to_owned())]);
	assert!(!runtime.registry().contains(&TagType::local("listener")));
}
