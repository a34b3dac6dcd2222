use replikv::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_ping_command() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::ping_command(),
            TestUtils::expected_simple_string("PONG"),
        ),
        (
            TestUtils::invalid_command(&["ping", "grape"]),
            TestUtils::expected_bulk_string("grape"),
        ),
    ];

    for (command, expected_response) in test_cases {
        env.exec_command_ok(command, &TestUtils::client_address(41844), &expected_response)
            .await;
    }
}

#[tokio::test]
async fn test_handle_ping_command_invalid() {
    let env = TestEnv::new_master_server();

    env.exec_command_err(
        TestUtils::invalid_command(&["PING", "grape", "mango"]),
        &TestUtils::client_address(41844),
        CommandError::InvalidPingCommand,
    )
    .await;
}
