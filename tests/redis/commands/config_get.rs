use replikv::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_config_get_command() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::config_get_command(&["dir"]),
            TestUtils::expected_bulk_string_array(&["dir", "/tmp/redis-files"]),
        ),
        (
            TestUtils::config_get_command(&["dbfilename"]),
            TestUtils::expected_bulk_string_array(&["dbfilename", "dump.rdb"]),
        ),
        (
            TestUtils::config_get_command(&["DIR"]),
            TestUtils::expected_bulk_string_array(&["DIR", "/tmp/redis-files"]),
        ),
        (
            TestUtils::config_get_command(&["dir", "dbfilename"]),
            TestUtils::expected_bulk_string_array(&[
                "dir",
                "/tmp/redis-files",
                "dbfilename",
                "dump.rdb",
            ]),
        ),
        (
            TestUtils::invalid_command(&["config", "get", "dir"]),
            TestUtils::expected_bulk_string_array(&["dir", "/tmp/redis-files"]),
        ),
    ];

    for (command, expected_response) in test_cases {
        env.exec_command_ok(command, &TestUtils::client_address(41844), &expected_response)
            .await;
    }
}

#[tokio::test]
async fn test_handle_config_get_command_invalid() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::config_get_command(&[]),
            CommandError::InvalidConfigGetCommand,
        ),
        (
            TestUtils::config_get_command(&["maxmemory"]),
            CommandError::InvalidConfigGetCommandArgument,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
