//! Integration tests for loading workflow directories and driving transitions.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use erpflow_core::{
    typed_validator, DuplicatePolicy, EngineConfig, EngineError, StateMachineFactory,
    TransitionContext,
};
use erpflow_spec::DefinitionError;

const SALES_ORDER: &str = r#"
workflow_id: sales_order
model: sale.order
initial: draft
states: [draft, quotation, confirmed, cancelled, closed]
transitions:
  - name: confirm
    from: [draft, quotation]
    to: confirmed
    validator: credit_check
    permission: sales.manager
  - name: cancel
    from: [draft, quotation, confirmed]
    to: cancelled
  - name: force_close
    from: ["*"]
    to: closed
"#;

const STOCK_MOVE: &str = r#"
workflow_id: stock_move
model: stock.move
initial: waiting
states: [waiting, reserved, done]
transitions:
  - name: reserve
    from: waiting
    to: reserved
  - name: validate
    from: reserved
    to: done
"#;

const QUALITY_CHECK_TOML: &str = r#"
workflow_id = "quality_check"
model = "quality.inspection"
initial = "pending"
states = ["pending", "passed", "failed"]

[[transitions]]
name = "pass"
from = "pending"
to = "passed"

[[transitions]]
name = "fail"
from = "pending"
to = "failed"
"#;

struct SalesOrder {
    credit_ok: bool,
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Loading k documents makes exactly those k workflows available.
#[tokio::test]
async fn test_load_directory_round_trip() {
    let temp = tempdir().unwrap();
    write(temp.path(), "sales_order.yaml", SALES_ORDER);
    write(temp.path(), "stock_move.yml", STOCK_MOVE);
    write(temp.path(), "quality_check.toml", QUALITY_CHECK_TOML);
    fs::create_dir(temp.path().join("drafts")).unwrap();

    let factory = StateMachineFactory::default();
    let loaded = factory.load_from_directory(temp.path()).await.unwrap();

    assert_eq!(loaded, 3);
    assert_eq!(
        factory.workflow_ids().await,
        vec!["quality_check", "sales_order", "stock_move"]
    );
    for id in ["quality_check", "sales_order", "stock_move"] {
        let machine = factory.get_state_machine(id).await.unwrap();
        assert_eq!(machine.current_state().await, machine.definition().initial_state);
    }
    assert!(factory.get_state_machine("purchase_order").await.is_none());
    assert_eq!(factory.get_all_state_machines().await.len(), 3);
}

/// A failing document aborts the load, names the file and leaves earlier loads intact.
#[tokio::test]
async fn test_load_directory_fails_fast() {
    let good = tempdir().unwrap();
    write(good.path(), "stock_move.yaml", STOCK_MOVE);

    let factory = StateMachineFactory::default();
    factory.load_from_directory(good.path()).await.unwrap();

    let bad = tempdir().unwrap();
    write(bad.path(), "a_sales_order.yaml", SALES_ORDER);
    write(bad.path(), "b_broken.yaml", "workflow_id: [");

    let err = factory.load_from_directory(bad.path()).await.unwrap_err();
    match err {
        EngineError::Definition(ref e) => {
            assert!(e.failed_path().unwrap().ends_with("b_broken.yaml"));
            assert!(matches!(e.root(), DefinitionError::Parse { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(factory.workflow_ids().await, vec!["stock_move"]);
}

/// Cross-reference errors are caught at load time.
#[tokio::test]
async fn test_load_directory_rejects_invalid_workflow() {
    let temp = tempdir().unwrap();
    write(
        temp.path(),
        "broken.yaml",
        "workflow_id: broken\nmodel: x\ninitial: start\nstates: [draft]\n",
    );

    let factory = StateMachineFactory::default();
    let err = factory.load_from_directory(temp.path()).await.unwrap_err();
    match err {
        EngineError::Definition(ref e) => {
            assert!(matches!(e.root(), DefinitionError::Validation { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(factory.is_empty().await);
}

/// With the default policy the later file (in name order) wins.
#[tokio::test]
async fn test_duplicate_ids_last_file_wins() {
    let temp = tempdir().unwrap();
    write(temp.path(), "1_stock.yaml", STOCK_MOVE);
    write(
        temp.path(),
        "2_stock.yaml",
        &STOCK_MOVE.replace("initial: waiting", "initial: reserved"),
    );

    let factory = StateMachineFactory::default();
    factory.load_from_directory(temp.path()).await.unwrap();

    let machine = factory.get_state_machine("stock_move").await.unwrap();
    assert_eq!(machine.current_state().await, "reserved");
}

#[tokio::test]
async fn test_duplicate_ids_rejected_by_policy() {
    let temp = tempdir().unwrap();
    write(temp.path(), "1_stock.yaml", STOCK_MOVE);
    write(temp.path(), "2_stock.yaml", STOCK_MOVE);

    let factory =
        StateMachineFactory::new(EngineConfig::new().with_duplicate_policy(DuplicatePolicy::Reject));
    let err = factory.load_from_directory(temp.path()).await.unwrap_err();

    assert!(matches!(err, EngineError::DuplicateWorkflow { .. }));
    assert!(factory.is_empty().await);
}

/// The sales order scenario: confirm from draft succeeds, from cancelled it is illegal.
#[tokio::test]
async fn test_sales_order_scenario() {
    let temp = tempdir().unwrap();
    write(temp.path(), "sales_order.yaml", SALES_ORDER);

    let factory = StateMachineFactory::default();
    factory.load_from_directory(temp.path()).await.unwrap();
    factory
        .register_validator(
            "sales_order",
            "credit_check",
            Arc::new(typed_validator(|_ctx, order: &SalesOrder| {
                anyhow::ensure!(order.credit_ok, "credit limit exceeded");
                Ok(())
            })),
        )
        .await
        .unwrap();
    factory.ensure_validators_registered().await.unwrap();

    let ctx = TransitionContext::new().actor("alice");
    let order = SalesOrder { credit_ok: true };

    let outcome = factory
        .transition(&ctx, "sales_order", "draft", "confirm", &order)
        .await
        .unwrap();
    assert_eq!(outcome.to, "confirmed");
    assert_eq!(outcome.permission.as_deref(), Some("sales.manager"));

    let err = factory
        .transition(&ctx, "sales_order", "cancelled", "confirm", &order)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { .. }));

    let err = factory
        .transition(&ctx, "sales_order", "draft", "confirm", &SalesOrder { credit_ok: false })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed { .. }));

    for state in ["draft", "quotation", "confirmed", "cancelled", "closed"] {
        let outcome = factory
            .transition(&ctx, "sales_order", state, "force_close", &order)
            .await
            .unwrap();
        assert_eq!(outcome.to, "closed");
    }
}

/// Different entities of one workflow type can be driven concurrently without interference.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_entities_share_one_machine() {
    let temp = tempdir().unwrap();
    write(temp.path(), "stock_move.yaml", STOCK_MOVE);

    let factory = Arc::new(StateMachineFactory::default());
    factory.load_from_directory(temp.path()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let factory = factory.clone();
        handles.push(tokio::spawn(async move {
            let ctx = TransitionContext::new();
            let mut state = "waiting".to_string();
            for action in ["reserve", "validate"] {
                let outcome = factory
                    .transition(&ctx, "stock_move", &state, action, &i)
                    .await
                    .unwrap();
                state = outcome.to;
            }
            state
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), "done");
    }
}
