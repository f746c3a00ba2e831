// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

const REGISTRY: &str = r#""Registry"
{
	"HKCU"
	{
		"Software"
		{
			"Valve"
			{
				"Steam"
				{
					"language"		"english"
					"RunningAppID"		"620"
					"SteamPath"		"/home/player/.local/share/Steam"
				}
			}
		}
	}
}
"#;

#[yare::parameterized(
    exact_case     = { "RunningAppID", Some("620") },
    other_case     = { "runningappid", Some("620") },
    path_value     = { "SteamPath", Some("/home/player/.local/share/Steam") },
    section_header = { "Steam", None },
    missing        = { "AutoLoginUser", None },
)]
fn vdf_lookup(key: &str, expected: Option<&str>) {
    assert_eq!(vdf_value(REGISTRY, key).as_deref(), expected);
}

#[yare::parameterized(
    decimal       = { "620", Some(620) },
    padded        = { " 620 ", Some(620) },
    registry_hex  = { "0x26c", Some(620) },
    upper_hex     = { "0X26C", Some(620) },
    zero          = { "0x0", Some(0) },
    garbage       = { "steam", None },
)]
fn app_id_parsing(raw: &str, expected: Option<u32>) {
    assert_eq!(parse_app_id(raw), expected);
}

#[test]
fn reg_query_output_is_parsed() {
    let output = "\r\nHKEY_CURRENT_USER\\Software\\Valve\\Steam\r\n    \
        RunningAppID    REG_DWORD    0x26c\r\n    \
        SteamPath    REG_SZ    c:/program files (x86)/steam\r\n\r\n";
    assert_eq!(reg_value(output, "RunningAppID").as_deref(), Some("0x26c"));
    assert_eq!(reg_value(output, "SteamPath").as_deref(), Some("c:/program files (x86)/steam"));
    assert_eq!(reg_value(output, "SteamExe"), None);
}

#[cfg(all(unix, not(target_os = "macos")))]
mod linux {
    use super::*;

    fn write_registry(home: &Path, running: &str) {
        let steam = home.join(".steam");
        std::fs::create_dir_all(&steam).unwrap();
        std::fs::write(
            steam.join("registry.vdf"),
            REGISTRY.replace("\"620\"", &format!("\"{}\"", running)),
        )
        .unwrap();
    }

    #[test]
    fn install_root_finds_first_existing_candidate() {
        let home = TempDir::new().unwrap();
        let root = home.path().join(".local/share/Steam");
        std::fs::create_dir_all(&root).unwrap();

        let found = SteamLocator::with_home(home.path()).install_root().unwrap();
        assert_eq!(found, root.canonicalize().unwrap());
    }

    #[test]
    fn install_root_missing_is_not_installed() {
        let home = TempDir::new().unwrap();
        let err = SteamLocator::with_home(home.path()).install_root().unwrap_err();
        assert!(matches!(err, SessionError::NotInstalled));
    }

    #[test]
    fn running_app_id_reads_registry_file() {
        let home = TempDir::new().unwrap();
        write_registry(home.path(), "620");
        assert_eq!(SteamLocator::with_home(home.path()).running_app_id().unwrap(), 620);
    }

    #[test]
    fn running_app_id_zero_means_nothing_running() {
        let home = TempDir::new().unwrap();
        write_registry(home.path(), "0");
        let err = SteamLocator::with_home(home.path()).running_app_id().unwrap_err();
        assert!(matches!(err, SessionError::NoActiveWorkload));
    }

    #[test]
    fn running_app_id_without_registry_is_not_installed() {
        let home = TempDir::new().unwrap();
        let err = SteamLocator::with_home(home.path()).running_app_id().unwrap_err();
        assert!(matches!(err, SessionError::NotInstalled));
    }

    #[test]
    fn running_app_id_unparseable_is_read_error() {
        let home = TempDir::new().unwrap();
        write_registry(home.path(), "soon");
        let err = SteamLocator::with_home(home.path()).running_app_id().unwrap_err();
        assert!(matches!(err, SessionError::Read(_)));
    }
}
