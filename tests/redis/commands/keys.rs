use std::collections::HashMap;

use replikv::{commands::CommandError, server::RedisRole};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_keys_command() {
    let env = TestEnv::with_snapshot(
        RedisRole::Master,
        HashMap::from([
            ("france".to_string(), TestUtils::snapshot_entry("paris")),
            ("fruit".to_string(), TestUtils::snapshot_entry("mango")),
        ]),
    );

    env.exec_command_ok(
        TestUtils::set_command("fruit", "apple"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;
    env.exec_command_ok(
        TestUtils::set_command("random", "value"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let test_cases = vec![
        (
            TestUtils::keys_command("*"),
            TestUtils::expected_bulk_string_array(&["france", "fruit", "random"]),
        ),
        (
            TestUtils::keys_command("fr*"),
            TestUtils::expected_bulk_string_array(&["france", "fruit"]),
        ),
        (
            TestUtils::keys_command("fr?it"),
            TestUtils::expected_bulk_string_array(&["fruit"]),
        ),
        (
            TestUtils::keys_command("random"),
            TestUtils::expected_bulk_string_array(&["random"]),
        ),
        (
            TestUtils::keys_command("random_key"),
            TestUtils::expected_bulk_string_array(&[]),
        ),
    ];

    for (command, expected_response) in test_cases {
        env.exec_command_ok(command, &TestUtils::client_address(41844), &expected_response)
            .await;
    }
}

#[tokio::test]
async fn test_handle_keys_command_invalid() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["KEYS"]),
            CommandError::InvalidKeysCommand,
        ),
        (
            TestUtils::invalid_command(&["KEYS", "grape", "mango"]),
            CommandError::InvalidKeysCommand,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
