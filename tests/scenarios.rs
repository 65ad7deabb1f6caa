//! Integration tests covering the engine's concrete worked scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use desim_engine::modules::batch::BatchType;
use desim_engine::streams::{ConstantDelay, FixedArrivals, FixedDelays};
use desim_engine::{
    AssignModule, BatchModule, CostAllocation, CreateModule, DecideTwoWayModule, DelayModule,
    DisposeModule, DuplicateModule, Environment, ReleaseModule, Resource, SeizeModule,
    SeparateModule,
};
use desim_engine::modules::assign::Assignment;
use desim_engine::modules::decide::ConditionFn;

#[test]
fn empty_source_yields_no_entities() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let sink = DisposeModule::new("Dispose");
    let create = CreateModule::new(
        "Create",
        "Widget",
        Box::new(FixedArrivals(vec![])),
        0.0,
        1,
        None,
        id_gen,
        sink,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(100.0)
        .unwrap();

    assert!(output.metrics_table().is_empty());
}

#[test]
fn mm1_style_queueing_accrues_wait_time_and_utilization() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let resource = Rc::new(RefCell::new(Resource::new("Clerk", 1)));

    let dispose = DisposeModule::new("Dispose");
    let release = ReleaseModule::new("Release", 1, Rc::clone(&resource), dispose);
    let delay = DelayModule::new(
        "Service",
        CostAllocation::ValueAdded,
        Box::new(ConstantDelay(2.0)),
        release,
    );
    let seize = SeizeModule::new("Seize", 1, Rc::clone(&resource), delay);
    let create = CreateModule::new(
        "Arrive",
        "Customer",
        Box::new(FixedArrivals(vec![1.0, 2.0, 3.0])),
        0.0,
        1,
        None,
        id_gen,
        seize,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(20.0)
        .unwrap();

    let table = output.metrics_table();
    assert_eq!(table.len(), 3);

    let mut disposed_at: Vec<f64> = table.values().filter_map(|m| m.disposed_at).collect();
    disposed_at.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(disposed_at, vec![3.0, 5.0, 7.0]);

    let mut wait_times: Vec<f64> = table.values().map(|m| m.wait_time).collect();
    wait_times.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(wait_times, vec![0.0, 1.0, 2.0]);

    assert!((output.utilization_of(&resource.borrow()) - 0.30).abs() < 1e-9);
}

#[test]
fn release_wakes_a_single_queued_seize_with_correct_wait_time() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let resource = Rc::new(RefCell::new(Resource::new("Machine", 1)));

    let dispose = DisposeModule::new("Dispose");
    let release = ReleaseModule::new("Release", 1, Rc::clone(&resource), dispose);
    let delay = DelayModule::new(
        "Run",
        CostAllocation::ValueAdded,
        Box::new(ConstantDelay(5.0)),
        release,
    );
    let seize = SeizeModule::new("Seize", 1, Rc::clone(&resource), delay);
    let create = CreateModule::new(
        "Arrive",
        "Job",
        Box::new(FixedArrivals(vec![0.0, 0.0])),
        0.0,
        1,
        None,
        id_gen,
        seize,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(20.0)
        .unwrap();

    let mut disposed_at: Vec<f64> = output
        .metrics_table()
        .values()
        .filter_map(|m| m.disposed_at)
        .collect();
    disposed_at.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(disposed_at, vec![5.0, 10.0]);

    let mut wait_times: Vec<f64> = output.metrics_table().values().map(|m| m.wait_time).collect();
    wait_times.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(wait_times, vec![0.0, 5.0]);
}

#[test]
fn attribute_batch_matches_on_shared_key_and_accrues_wait_time() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let dispose = DisposeModule::new("Dispose");
    let batch = BatchModule::new(
        "Batch",
        BatchType::Attribute {
            key: "group".to_string(),
        },
        2,
        Some("GroupedOrder".to_string()),
        Rc::clone(&id_gen),
        dispose,
    )
    .unwrap();

    let value_fn: Rc<dyn Fn(&std::collections::HashMap<String, serde_json::Value>, &std::collections::HashMap<String, serde_json::Value>) -> serde_json::Value> =
        Rc::new(|_, _| serde_json::json!(7));
    let assign = AssignModule::new(
        "TagGroup",
        vec![Assignment::attribute("group", value_fn)],
        batch,
    );

    let create = CreateModule::new(
        "Arrive",
        "Order",
        Box::new(FixedArrivals(vec![1.0, 3.0])),
        0.0,
        1,
        None,
        id_gen,
        assign,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(20.0)
        .unwrap();

    // Two constituents plus one BatchEntity = three metric rows.
    assert_eq!(output.metrics_table().len(), 3);

    let batch_row = output
        .metrics_table()
        .values()
        .find(|m| m.entity_type == "GroupedOrder")
        .expect("a batch entity is formed once both constituents share the key");
    assert_eq!(batch_row.created_at, Some(3.0));
    assert_eq!(batch_row.disposed_at, Some(3.0));

    let waiter_wait_time = output
        .metrics_table()
        .values()
        .map(|m| m.wait_time)
        .fold(0.0_f64, f64::max);
    assert!((waiter_wait_time - 2.0).abs() < 1e-9);
}

#[test]
fn duplicate_then_batch_rendezvous_by_shared_attribute() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let dispose = DisposeModule::new("Dispose");
    let batch = BatchModule::new(
        "Rendezvous",
        BatchType::Attribute {
            key: "serial".to_string(),
        },
        2,
        Some("Pair".to_string()),
        Rc::clone(&id_gen),
        dispose,
    )
    .unwrap();

    let tag_fn: Rc<dyn Fn(&std::collections::HashMap<String, serde_json::Value>, &std::collections::HashMap<String, serde_json::Value>) -> serde_json::Value> =
        Rc::new(|_, attr| attr.get("serial").cloned().unwrap_or(serde_json::Value::Null));
    let assign = AssignModule::new("TagSerial", vec![Assignment::attribute("serial", tag_fn)], batch);

    let slow = DelayModule::new(
        "SlowBranch",
        CostAllocation::ValueAdded,
        Box::new(ConstantDelay(5.0)),
        Rc::clone(&assign) as Rc<dyn desim_engine::ModuleNode>,
    );
    let fast = DelayModule::new(
        "FastBranch",
        CostAllocation::ValueAdded,
        Box::new(ConstantDelay(2.0)),
        Rc::clone(&assign) as Rc<dyn desim_engine::ModuleNode>,
    );

    let duplicate = DuplicateModule::new("Split", Rc::clone(&id_gen), fast, slow);

    let create = CreateModule::new(
        "Arrive",
        "Token",
        Box::new(FixedArrivals(vec![0.0])),
        0.0,
        1,
        None,
        id_gen,
        duplicate,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(20.0)
        .unwrap();

    let pair = output
        .metrics_table()
        .values()
        .find(|m| m.entity_type == "Pair")
        .expect("rendezvous forms a Pair batch entity");
    assert_eq!(pair.created_at, Some(5.0));
    assert_eq!(pair.disposed_at, Some(5.0));
}

#[test]
fn separate_disposes_the_batch_and_forwards_constituents_independently() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let dispose = DisposeModule::new("Dispose");
    let separate = SeparateModule::new("Separate", dispose);
    let batch = BatchModule::new(
        "Batch",
        BatchType::Any,
        2,
        Some("Pair".to_string()),
        Rc::clone(&id_gen),
        separate,
    )
    .unwrap();

    let create = CreateModule::new(
        "Arrive",
        "Item",
        Box::new(FixedArrivals(vec![1.0, 1.0])),
        0.0,
        1,
        None,
        id_gen,
        batch,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(20.0)
        .unwrap();

    let item_rows: Vec<_> = output
        .metrics_table()
        .values()
        .filter(|m| m.entity_type == "Item")
        .collect();
    assert_eq!(item_rows.len(), 2);
    assert!(item_rows.iter().all(|m| m.disposed_at == Some(1.0)));

    let pair_row = output
        .metrics_table()
        .values()
        .find(|m| m.entity_type == "Pair")
        .unwrap();
    assert_eq!(pair_row.disposed_at, Some(1.0));
}

#[test]
fn two_way_decision_routes_to_the_correct_branch() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let true_sink = DisposeModule::new("TrueSink");
    let false_sink = DisposeModule::new("FalseSink");

    let condition: ConditionFn = Rc::new(|_, attr| {
        attr.get("priority").and_then(|v| v.as_str()) == Some("high")
    });
    let decide = DecideTwoWayModule::new("Route", condition, true_sink, false_sink);

    let tag_fn: Rc<dyn Fn(&std::collections::HashMap<String, serde_json::Value>, &std::collections::HashMap<String, serde_json::Value>) -> serde_json::Value> =
        Rc::new(|_, _| serde_json::json!("high"));
    let assign = AssignModule::new("TagPriority", vec![Assignment::attribute("priority", tag_fn)], decide);

    let create = CreateModule::new(
        "Arrive",
        "Ticket",
        Box::new(FixedArrivals(vec![0.0])),
        0.0,
        1,
        None,
        id_gen,
        assign,
    );

    let output = Environment::new()
        .add_arrival_module(create)
        .run_simulation(10.0)
        .unwrap();

    assert_eq!(output.metrics_table().len(), 1);
    let row = output.metrics_table().values().next().unwrap();
    assert_eq!(row.disposed_at, Some(0.0));
}

#[test]
fn delay_stream_exhaustion_surfaces_as_an_engine_error() {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let dispose = DisposeModule::new("Dispose");
    let delay = DelayModule::new(
        "Starved",
        CostAllocation::ValueAdded,
        Box::new(FixedDelays::new(vec![])),
        dispose,
    );
    let create = CreateModule::new(
        "Arrive",
        "Item",
        Box::new(FixedArrivals(vec![0.0])),
        0.0,
        1,
        None,
        id_gen,
        delay,
    );

    let result = Environment::new()
        .add_arrival_module(create)
        .run_simulation(10.0);

    assert!(result.is_err());
}
