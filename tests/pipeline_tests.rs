mod common;

use common::*;
use fleet_dispatch::adapters::outbound::RecordingCommandSink;
use fleet_dispatch::domains::dispatching::*;
use fleet_dispatch::domains::fleet::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Records how often it ran and whether it was initialized.
struct CountingPhase {
    runs: Arc<AtomicUsize>,
    initialized: Arc<AtomicBool>,
}

impl Phase for CountingPhase {
    fn name(&self) -> &'static str {
        "counting"
    }
    fn initialize(&mut self) {
        self.initialized.store(true, Ordering::SeqCst);
    }
    fn terminate(&mut self) {
        self.initialized.store(false, Ordering::SeqCst);
    }
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
    fn run(&mut self, _ctx: &mut DispatchContext<'_>) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}

fn counting() -> (CountingPhase, Arc<AtomicUsize>, Arc<AtomicBool>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let initialized = Arc::new(AtomicBool::new(false));
    (
        CountingPhase { runs: runs.clone(), initialized: initialized.clone() },
        runs,
        initialized,
    )
}

#[test]
fn test_phase_order_is_fixed() {
    let pipeline = DispatchPipeline::new(&assignment_only_config());

    assert_eq!(
        pipeline.phase_names(),
        vec![
            "check_new_orders",
            "finish_withdrawals",
            "assign_next_drive_orders",
            "assign_sequence_successors",
            "assign_reserved_orders",
            "assign_free_orders",
            "recharge_idle_vehicles",
            "prioritized_repark",
            "prioritized_parking",
            "park_idle_vehicles",
        ]
    );
}

#[test]
fn test_lifecycle_is_idempotent() {
    let mut pipeline = DispatchPipeline::new(&assignment_only_config());
    assert!(!pipeline.is_initialized());

    pipeline.initialize();
    pipeline.initialize();
    assert!(pipeline.is_initialized());

    pipeline.terminate();
    pipeline.terminate();
    assert!(!pipeline.is_initialized());
}

#[test]
fn test_hooks_are_replaceable() {
    let (phase, runs, initialized) = counting();
    let mut pipeline = DispatchPipeline::new(&assignment_only_config())
        .with_assign_orders(vec![Box::new(phase)]);
    pipeline.initialize();
    assert!(initialized.load(Ordering::SeqCst));

    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    fleet.create_order(order("O1", &["B"])).unwrap();
    let mut sink = RecordingCommandSink::new();
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(pipeline.phase_names().contains(&"counting"));
    assert!(!pipeline.phase_names().contains(&"assign_free_orders"));
    // Intake still ran, the replaced hook did not assign.
    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Dispatchable);
}

#[test]
fn test_hook_replaced_on_running_pipeline_is_initialized() {
    let mut pipeline = started_pipeline(&assignment_only_config());
    let (phase, _, initialized) = counting();

    pipeline.set_park_vehicles(vec![Box::new(phase)]);
    assert!(initialized.load(Ordering::SeqCst));

    pipeline.terminate();
    assert!(!initialized.load(Ordering::SeqCst));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "not initialized")]
fn test_run_before_initialize_is_a_programming_error() {
    let mut pipeline = DispatchPipeline::new(&assignment_only_config());
    let mut fleet = plant();
    let mut sink = RecordingCommandSink::new();
    run_phase(&mut pipeline, &mut fleet, &mut sink);
}

#[test]
fn test_order_runs_to_completion() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    fleet.create_order(order("O1", &["B", "C"])).unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    report_arrival(&mut fleet, "V1");
    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert_eq!(fleet.vehicle("V1").unwrap().target_location.as_deref(), Some("C"));
    report_arrival(&mut fleet, "V1");
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Finished);
    let v1 = fleet.vehicle("V1").unwrap();
    assert_eq!(v1.state, ProcState::Idle);
    assert!(v1.order.is_none());
    assert_eq!(v1.current_location.as_deref(), Some("C"));
    assert!(fleet.claims().claims_of("V1").is_empty());
    let destinations: Vec<String> = sink
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            DispatchCommand::Drive { destination, .. } => Some(destination),
            _ => None,
        })
        .collect();
    assert_eq!(destinations, vec!["B", "C"]);
    assert_eq!(pipeline.cycles(), 3);
}

#[test]
fn test_dependent_order_follows_finished_dependency() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    fleet.create_order(order("O1", &["B"])).unwrap();
    fleet
        .create_order(order("O2", &["C"]).with_dependencies(["O1"]))
        .unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert_eq!(fleet.order("O2").unwrap().state, OrderState::Raw);
    report_arrival(&mut fleet, "V1");
    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Finished);
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(fleet.order("O2").unwrap().state, OrderState::BeingProcessed);
    assert_eq!(fleet.order("O2").unwrap().vehicle.as_deref(), Some("V1"));
}

#[test]
fn test_withdrawal_completes_in_one_cycle_after_vehicle_stops() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    fleet.create_order(order("O1", &["B", "C"])).unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    fleet.request_withdrawal("O1").unwrap();
    fleet.request_withdrawal("O1").unwrap();
    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Withdrawn);

    // Still driving: nothing to finalize yet.
    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Withdrawn);

    // An IDLE report from a bound vehicle means it stopped and waits.
    fleet
        .update_vehicle(VehicleUpdate::new("V1").state(ProcState::Idle))
        .unwrap();
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::AwaitingOrder);
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(
        fleet.order("O1").unwrap().state,
        OrderState::Failed(FailureReason::Withdrawn)
    );
    let v1 = fleet.vehicle("V1").unwrap();
    assert_eq!(v1.state, ProcState::Idle);
    assert!(v1.order.is_none());
    assert!(fleet.claims().claims_of("V1").is_empty());
}

#[test]
fn test_gated_step_waits_for_peripheral_job() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "C")).unwrap();
    let job = PeripheralJob::new("J", "V1", PeripheralOperation::new("B", "open-door"))
        .unwrap()
        .related_to_vehicle("V1");
    fleet.register_peripheral_job(job).unwrap();
    fleet
        .create_order(TransportOrder::new(
            "O2",
            vec![DriveStep::new("A", "Load"), DriveStep::new("B", "Unload").gated_by("J")],
        ))
        .unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    report_arrival(&mut fleet, "V1");
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(
        fleet.peripheral_job("J").unwrap().state,
        PeripheralJobState::Executing
    );
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::AwaitingOrder);
    let issued = sink.drain();
    assert!(issued.contains(&DispatchCommand::TriggerPeripheralJob {
        job_id: "J".to_string(),
        location: "B".to_string(),
        operation: "open-door".to_string(),
    }));

    // Job still running: no new commands, job not triggered twice.
    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert!(sink.drain().is_empty());

    let finished = fleet.peripheral_job("J").unwrap().clone();
    fleet.peripheral_job_finished(&finished).unwrap();
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(
        sink.drain(),
        vec![DispatchCommand::Drive {
            vehicle_id: "V1".to_string(),
            order_id: "O2".to_string(),
            step_index: 1,
            destination: "B".to_string(),
            operation: "Unload".to_string(),
        }]
    );
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::Executing);
}

#[test]
fn test_failed_peripheral_job_fails_waiting_order() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "C")).unwrap();
    let job = PeripheralJob::new("J", "V1", PeripheralOperation::new("B", "open-door")).unwrap();
    fleet.register_peripheral_job(job).unwrap();
    fleet
        .create_order(TransportOrder::new(
            "O2",
            vec![DriveStep::new("B", "Unload").gated_by("J")],
        ))
        .unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::AwaitingOrder);

    let failed = fleet.peripheral_job("J").unwrap().clone();
    fleet.peripheral_job_failed(&failed).unwrap();
    assert_eq!(
        fleet.order("O2").unwrap().state,
        OrderState::Failed(FailureReason::PeripheralJobFailed { job_id: "J".to_string() })
    );

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    let v1 = fleet.vehicle("V1").unwrap();
    assert_eq!(v1.state, ProcState::Idle);
    assert!(v1.order.is_none());
}

#[test]
fn test_unknown_peripheral_job_report_is_recorded() {
    let mut fleet = plant();
    let job = PeripheralJob::new("J9", "token", PeripheralOperation::new("A", "lift")).unwrap();

    fleet.peripheral_job_finished(&job).unwrap();

    assert_eq!(
        fleet.peripheral_job("J9").unwrap().state,
        PeripheralJobState::Finished
    );
}

#[test]
fn test_sequence_members_run_in_order_on_one_vehicle() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "C")).unwrap();
    fleet.register_vehicle(vehicle_at("V2", &fleet, "A")).unwrap();
    fleet.create_sequence(OrderSequence::new("S1")).unwrap();
    for (id, destination) in [("O1", "A"), ("O2", "B"), ("O3", "C")] {
        fleet
            .create_order(order(id, &[destination]).in_sequence("S1"))
            .unwrap();
    }
    fleet.complete_sequence("S1").unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    for _ in 0..12 {
        run_phase(&mut pipeline, &mut fleet, &mut sink);
        assert!(fleet.invariant_violations().is_empty());
        let processing = ["O1", "O2", "O3"]
            .iter()
            .filter(|id| fleet.order(id).unwrap().state == OrderState::BeingProcessed)
            .count();
        assert!(processing <= 1);
        for vehicle_id in fleet.vehicle_ids_where(|v| v.state == ProcState::Executing) {
            report_arrival(&mut fleet, &vehicle_id);
        }
    }

    assert!(fleet.orders().all(|o| o.state == OrderState::Finished));
    let bound: Vec<String> = ["O1", "O2", "O3"]
        .iter()
        .map(|id| fleet.order(id).unwrap().vehicle.clone().unwrap())
        .collect();
    assert!(bound.iter().all(|v| v == &bound[0]));
    let sequence = fleet.sequence("S1").unwrap();
    assert!(sequence.finished);
    assert!(fleet.vehicle(&bound[0]).unwrap().sequence.is_none());
    let destinations: Vec<String> = sink
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            DispatchCommand::Drive { destination, .. } => Some(destination),
            _ => None,
        })
        .collect();
    assert_eq!(destinations, vec!["A", "B", "C"]);
}

#[test]
fn test_invariants_hold_after_every_cycle() {
    let mut fleet = plant();
    for (id, at) in [("V1", "A"), ("V2", "B"), ("V3", "C")] {
        fleet.register_vehicle(vehicle_at(id, &fleet, at)).unwrap();
    }
    for (i, destination) in ["A", "B", "C", "A", "B"].iter().enumerate() {
        fleet
            .create_order(order(&format!("O{}", i), &[destination]))
            .unwrap();
    }
    fleet.request_withdrawal("O4").unwrap();
    let mut pipeline = started_pipeline(&fleet_dispatch::config::DispatcherConfig::default());
    let mut sink = RecordingCommandSink::new();

    for cycle in 0..10 {
        run_phase(&mut pipeline, &mut fleet, &mut sink);
        assert!(
            fleet.invariant_violations().is_empty(),
            "cycle {}: {:?}",
            cycle,
            fleet.invariant_violations()
        );
        for vehicle in fleet.vehicles() {
            if vehicle.state == ProcState::Idle {
                assert!(vehicle.order.is_none());
            }
        }
        for vehicle_id in fleet.vehicle_ids_where(|v| v.state == ProcState::Executing) {
            report_arrival(&mut fleet, &vehicle_id);
        }
    }
}

#[test]
fn test_optional_peripheral_job_is_started_while_vehicle_drives_on() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "C")).unwrap();
    let operation = PeripheralOperation::new("B", "open-door").completion_required(false);
    let job = PeripheralJob::new("J", "V1", operation).unwrap();
    fleet.register_peripheral_job(job).unwrap();
    fleet
        .create_order(TransportOrder::new(
            "O1",
            vec![DriveStep::new("B", "Unload").gated_by("J")],
        ))
        .unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(
        sink.drain(),
        vec![
            DispatchCommand::TriggerPeripheralJob {
                job_id: "J".to_string(),
                location: "B".to_string(),
                operation: "open-door".to_string(),
            },
            DispatchCommand::Drive {
                vehicle_id: "V1".to_string(),
                order_id: "O1".to_string(),
                step_index: 0,
                destination: "B".to_string(),
                operation: "Unload".to_string(),
            },
        ]
    );
    assert_eq!(fleet.peripheral_job("J").unwrap().state, PeripheralJobState::Executing);
    assert_eq!(fleet.order("O1").unwrap().state, OrderState::BeingProcessed);
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::Executing);
}

#[test]
fn test_step_gated_by_already_failed_job_fails_order() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "C")).unwrap();
    let job = PeripheralJob::new("J", "V1", PeripheralOperation::new("B", "open-door")).unwrap();
    fleet.register_peripheral_job(job.clone()).unwrap();
    fleet.peripheral_job_failed(&job).unwrap();
    fleet
        .create_order(TransportOrder::new(
            "O1",
            vec![DriveStep::new("B", "Unload").gated_by("J")],
        ))
        .unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert!(sink.drain().is_empty());
    assert_eq!(
        fleet.order("O1").unwrap().state,
        OrderState::Failed(FailureReason::PeripheralJobFailed { job_id: "J".to_string() })
    );
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::AwaitingOrder);

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    let v1 = fleet.vehicle("V1").unwrap();
    assert_eq!(v1.state, ProcState::Idle);
    assert!(v1.order.is_none());
    assert!(sink.drain().is_empty());
}

#[test]
fn test_sequence_member_stays_raw_behind_withdrawn_predecessor() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "C")).unwrap();
    fleet.create_sequence(OrderSequence::new("S1")).unwrap();
    fleet.create_order(order("A1", &["A"]).in_sequence("S1")).unwrap();
    fleet.create_order(order("B1", &["B"]).in_sequence("S1")).unwrap();
    fleet.complete_sequence("S1").unwrap();
    fleet.request_withdrawal("A1").unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    for _ in 0..3 {
        run_phase(&mut pipeline, &mut fleet, &mut sink);
        assert_eq!(fleet.order("B1").unwrap().state, OrderState::Raw);
    }
    assert!(fleet.vehicle("V1").unwrap().order.is_none());
    assert!(sink.commands().is_empty());

    // Withdrawing the blocked member lets the sequence finish.
    fleet.request_withdrawal("B1").unwrap();
    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert!(fleet.sequence("S1").unwrap().finished);
}

#[test]
fn test_failed_member_releases_vehicle_from_sequence() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    let job = PeripheralJob::new("J", "V1", PeripheralOperation::new("B", "open-door")).unwrap();
    fleet.register_peripheral_job(job).unwrap();
    fleet.create_sequence(OrderSequence::new("S1")).unwrap();
    fleet
        .create_order(
            TransportOrder::new("A1", vec![DriveStep::new("B", "Unload").gated_by("J")])
                .in_sequence("S1"),
        )
        .unwrap();
    fleet.create_order(order("B1", &["C"]).in_sequence("S1")).unwrap();
    fleet.complete_sequence("S1").unwrap();
    let mut pipeline = started_pipeline(&assignment_only_config());
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    assert_eq!(fleet.sequence("S1").unwrap().vehicle.as_deref(), Some("V1"));
    let failed = fleet.peripheral_job("J").unwrap().clone();
    fleet.peripheral_job_failed(&failed).unwrap();

    for _ in 0..3 {
        run_phase(&mut pipeline, &mut fleet, &mut sink);
        assert_eq!(fleet.order("B1").unwrap().state, OrderState::Raw);
    }
    let v1 = fleet.vehicle("V1").unwrap();
    assert_eq!(v1.state, ProcState::Idle);
    assert!(v1.order.is_none());
    assert!(v1.sequence.is_none());
    assert!(fleet.sequence("S1").unwrap().vehicle.is_none());
    assert!(!sink
        .commands()
        .iter()
        .any(|c| matches!(c, DispatchCommand::Drive { order_id, .. } if order_id == "B1")));
}
