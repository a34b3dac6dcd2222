use replikv::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_unknown_command_is_acknowledged() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        TestUtils::invalid_command(&["FLUSHALL"]),
        TestUtils::invalid_command(&["CONFIG", "SET", "dir", "/tmp"]),
        TestUtils::invalid_command(&["wait", "0", "100"]),
    ];

    for command in test_cases {
        env.exec_command_ok(
            command,
            &TestUtils::client_address(41844),
            &TestUtils::expected_simple_string("OK"),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_malformed_command() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (TestUtils::invalid_command(&[]), CommandError::InvalidCommand),
        (
            replikv::resp::RespValue::SimpleString("PING".to_string()),
            CommandError::InvalidCommand,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
