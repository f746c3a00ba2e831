// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    https        = { "https://store.steampowered.com/app/620" },
    steam        = { "steam://rungameid/620" },
    mailto       = { "mailto:someone@example.com" },
    plus_scheme  = { "git+ssh://host/repo" },
)]
fn accepts_uris(url: &str) {
    assert!(validate_url(url).is_ok());
}

#[yare::parameterized(
    empty        = { "" },
    no_scheme    = { "store.steampowered.com" },
    option       = { "--help" },
    drive_letter = { r"C:\Windows\notepad.exe" },
    digit_start  = { "1http://x" },
    bad_char     = { "ht tp://x" },
    nothing_after = { "steam:" },
    leading_colon = { ":foo" },
)]
fn rejects_non_uris(url: &str) {
    assert!(matches!(validate_url(url), Err(OpenError::InvalidUrl(_))));
}

#[tokio::test]
async fn invalid_url_never_reaches_opener() {
    let err = open_url("-not-a-url").await.unwrap_err();
    assert!(matches!(err, OpenError::InvalidUrl(u) if u == "-not-a-url"));
}
