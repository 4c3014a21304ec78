//! Ownership and binding behavior of `Statement` against the in-memory driver.

use std::mem;

use cqlx::{Arguments, Consistency, Error, ErrorKind, Statement, StatementOptions, Value};
use cqlx_core::mock::MockError;
use cqlx_test::{assert_all_released, driver};

#[test]
fn it_binds_a_single_key_and_releases_once() -> anyhow::Result<()> {
    let driver = driver();

    let mut statement = Statement::new(&driver, "SELECT * FROM t WHERE k=?", 1)?;
    statement.bind("key-1")?;

    assert_eq!(statement.bind_cursor(), 1);
    assert_eq!(statement.handle().query(), "SELECT * FROM t WHERE k=?");
    assert_eq!(statement.handle().values(), &[Some(Value::Text("key-1".into()))]);

    let id = statement.handle().id();
    drop(statement);

    assert_eq!(driver.release_count(id), 1);
    assert_all_released(&driver)
}

#[test]
fn it_never_ignores_a_bind_past_arity() -> anyhow::Result<()> {
    let driver = driver();

    let mut statement = Statement::new(&driver, "INSERT INTO t (k, v) VALUES (?, ?)", 2)?;
    statement.bind(1_i32)?;
    statement.bind_null()?;

    let err = statement.bind("extra").unwrap_err();
    assert!(matches!(err, Error::BindIndexOutOfBounds { index: 2, arity: 2 }));
    assert_eq!(statement.handle().values(), &[Some(Value::Int(1)), Some(Value::Null)]);

    // reset makes room again
    statement.reset(1)?;
    statement.bind("again")?;
    assert!(statement.is_fully_bound());

    drop(statement);
    assert_all_released(&driver)
}

#[test]
fn it_rebinds_after_reset_regardless_of_cursor() -> anyhow::Result<()> {
    let driver = driver();
    let mut statement = Statement::unbound(&driver, "UPDATE t SET a = ?, b = ? WHERE k = ?")?;

    for m in [3, 1, 0, 2] {
        statement.reset(m)?;
        assert_eq!(statement.bind_cursor(), 0);

        let mut args = Arguments::new();
        for i in 0..m {
            args.add(Some(i64::try_from(i)?))?;
        }

        statement.bind_all(args)?;
        assert_eq!(statement.bind_cursor(), m);
    }

    drop(statement);
    assert_all_released(&driver)
}

#[test]
fn it_transfers_ownership_through_a_chain_of_moves() -> anyhow::Result<()> {
    let driver = driver();

    let mut first = Statement::new(&driver, "SELECT * FROM t WHERE k = ? AND c = ?", 2)?;
    first.bind(uuid::Uuid::new_v4())?;
    let id = first.handle().id();

    let second = first;
    let mut holder = vec![second];
    let third = holder.pop().unwrap();

    assert_eq!(third.handle().id(), id);
    assert_eq!(third.bind_cursor(), 1);
    assert_eq!(driver.releases(), 0);

    drop(third);
    assert_eq!(driver.release_count(id), 1);
    assert_all_released(&driver)
}

#[test]
fn it_releases_only_the_overwritten_handle() -> anyhow::Result<()> {
    let driver = driver();

    let source = Statement::new(&driver, "SELECT a FROM t WHERE k = ?", 1)?;
    let mut target = Statement::new(&driver, "SELECT b FROM t", 0)?;
    let (source_id, target_id) = (source.handle().id(), target.handle().id());

    target = source;
    assert_eq!(driver.release_count(target_id), 1);
    assert!(driver.is_live(source_id));

    // assigning a value back to itself releases nothing
    let mut same = target;
    same = mem::replace(&mut same, Statement::unbound(&driver, "SELECT 1 FROM t")?);
    assert_eq!(same.handle().id(), source_id);
    assert_eq!(driver.release_count(source_id), 0);

    drop(same);
    assert_all_released(&driver)
}

#[test]
fn it_reports_allocation_errors_without_leaking() -> anyhow::Result<()> {
    let driver = driver();
    driver.set_allocation_limit(1);

    let held = Statement::unbound(&driver, "SELECT * FROM t")?;

    let err = Statement::unbound(&driver, "SELECT * FROM u").unwrap_err();
    assert!(err.is_allocation());
    assert_eq!(
        err.as_driver_error().map(|e| e.kind()),
        Some(ErrorKind::ResourceExhausted)
    );

    drop(held);
    let _again = Statement::unbound(&driver, "SELECT * FROM u")?;

    Ok(())
}

#[test]
fn it_propagates_resize_rejection() -> anyhow::Result<()> {
    let driver = driver();

    let mut statement = Statement::new(&driver, "SELECT * FROM t WHERE k = ?", 1)?;
    driver.fail_next_resize(MockError::new(ErrorKind::InvalidState, "cannot resize"));

    let err = statement.reset(2).unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(err.as_driver_error().and_then(|e| e.code()).as_deref(), Some("INVALID"));
    assert_eq!(statement.arity(), 1);

    drop(statement);
    assert_all_released(&driver)
}

#[test]
fn it_honors_configured_consistency() -> anyhow::Result<()> {
    let driver = driver();

    let default = Statement::unbound(&driver, "SELECT * FROM t")?;
    assert_eq!(default.handle().consistency(), Some(Consistency::Quorum));

    let options = StatementOptions::new()
        .consistency("local_quorum".parse()?)
        .disable_allocation_logging();
    let local = Statement::with_options(&driver, "SELECT * FROM t", 0, &options)?;
    assert_eq!(local.handle().consistency(), Some(Consistency::LocalQuorum));
    assert_eq!(local.consistency().map(|c| c.as_str()), Some("LOCAL_QUORUM"));

    // serial levels are accepted for the Paxos phase of conditional updates
    let mut conditional =
        Statement::new(&driver, "UPDATE t SET v = ? WHERE k = ? IF v = ?", 3)?;
    conditional.set_consistency(Consistency::LocalSerial)?;
    assert!(conditional.consistency().is_some_and(|c| c.is_serial()));
    assert!(!default.consistency().is_some_and(|c| c.is_serial()));

    drop((default, local, conditional));
    assert_all_released(&driver)
}

#[test]
fn it_releases_the_handle_when_consistency_is_rejected() -> anyhow::Result<()> {
    let driver = driver();

    driver.fail_next_consistency(MockError::new(ErrorKind::InvalidState, "level not supported"));

    let options = StatementOptions::new().consistency(Consistency::EachQuorum);
    let err = Statement::with_options(&driver, "SELECT * FROM t WHERE k = ?", 1, &options)
        .unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(err.as_driver_error().and_then(|e| e.code()).as_deref(), Some("INVALID"));

    // the handle was allocated, then released by the failed constructor
    assert_eq!(driver.allocations(), 1);
    assert_all_released(&driver)?;

    // on a live statement the previous level stays in effect
    let mut statement = Statement::new(&driver, "SELECT * FROM t WHERE k = ?", 1)?;
    driver.fail_next_consistency(MockError::new(ErrorKind::InvalidState, "level not supported"));

    assert!(statement.set_consistency(Consistency::Any).unwrap_err().is_protocol());
    assert_eq!(statement.consistency(), Some(Consistency::Quorum));
    assert_eq!(statement.handle().consistency(), Some(Consistency::Quorum));

    statement.bind("k")?;
    drop(statement);
    assert_all_released(&driver)
}
