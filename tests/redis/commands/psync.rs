use replikv::commands::{CommandError, CommandResult};

use crate::test_utils::{TestEnv, TestUtils, MASTER_REPL_ID};

#[tokio::test]
async fn test_handle_psync_command() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        TestUtils::psync_command("?", "-1"),
        TestUtils::psync_command(MASTER_REPL_ID, "0"),
        TestUtils::psync_command("59211996145553b6fd49a914e49210391ac94854", "42"),
    ];

    for command in test_cases {
        let result = env
            .exec_command(command, &TestUtils::client_address(41844))
            .await;

        assert_eq!(
            result,
            Ok(CommandResult::Sync(TestUtils::expected_simple_string(
                &format!("FULLRESYNC {} 0", MASTER_REPL_ID)
            )))
        );
    }

    // The replica is registered by the connection once the snapshot is sent.
    assert_eq!(env.replication.replica_count().await, 0);
}

#[tokio::test]
async fn test_handle_psync_command_invalid() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["PSYNC", "?"]),
            CommandError::InvalidPsyncCommand,
        ),
        (
            TestUtils::invalid_command(&["PSYNC", "?", "-1", "random"]),
            CommandError::InvalidPsyncCommand,
        ),
        (
            TestUtils::psync_command("?", "latest"),
            CommandError::InvalidPsyncOffset,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}

#[tokio::test]
async fn test_handle_psync_command_on_replica() {
    let env = TestEnv::new_replica_server();

    env.exec_command_err(
        TestUtils::psync_command("?", "-1"),
        &TestUtils::client_address(41844),
        CommandError::PsyncOnReplica,
    )
    .await;
}
