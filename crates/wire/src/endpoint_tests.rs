// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn socket_lives_in_private_directory_under_root() {
    let endpoint = Endpoint::with_root("courier-test", "/run/courier");
    assert_eq!(endpoint.dir(), PathBuf::from("/run/courier/courier-test"));
    assert_eq!(endpoint.socket_path(), PathBuf::from("/run/courier/courier-test/agent.sock"));
}

#[test]
fn pipe_name_uses_endpoint_name() {
    let endpoint = Endpoint::with_root("courier-test", "/unused");
    assert_eq!(endpoint.pipe_name(), r"\\.\pipe\courier-test");
}

#[test]
fn default_uses_well_known_name() {
    assert_eq!(Endpoint::default().name(), DEFAULT_ENDPOINT_NAME);
}
