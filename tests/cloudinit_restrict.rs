// CLASSIFICATION: COMMUNITY
// Filename: cloudinit_restrict.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use cohesix_cloudinit::status::StatusOutput;
use cohesix_cloudinit::{
    query_state, restrict, restrict_cloud_init, CloudInitAgent, CloudInitState, ErrorKind,
    RestrictAction, RestrictOptions, RootLayout,
};
use tempfile::tempdir;

struct FakeAgent {
    installed: bool,
    success: bool,
    output: String,
    calls: Cell<usize>,
}

impl FakeAgent {
    fn reporting(output: &str) -> Self {
        Self {
            installed: true,
            success: true,
            output: output.into(),
            calls: Cell::new(0),
        }
    }

    fn missing() -> Self {
        Self {
            installed: false,
            ..Self::reporting("")
        }
    }

    fn failing(output: &str) -> Self {
        Self {
            success: false,
            ..Self::reporting(output)
        }
    }
}

impl CloudInitAgent for FakeAgent {
    fn locate(&self) -> Option<PathBuf> {
        self.installed.then(|| PathBuf::from("/usr/bin/cloud-init"))
    }

    fn run_status(&self, _bin: &Path) -> cohesix_cloudinit::Result<StatusOutput> {
        self.calls.set(self.calls.get() + 1);
        Ok(StatusOutput {
            success: self.success,
            text: self.output.clone(),
        })
    }
}

fn write_status_json(layout: &RootLayout, datasource: &str) {
    let path = layout.status_file();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = serde_json::json!({ "v1": { "datasource": datasource, "errors": [] } });
    fs::write(path, body.to_string()).unwrap();
}

fn state_of(layout: &RootLayout, agent: &FakeAgent) -> CloudInitState {
    query_state(layout, agent).unwrap().state()
}

#[test]
fn status_words_reported_by_agent() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    let cases = [
        ("status: disabled\n", CloudInitState::Untriggered),
        ("status: error\n", CloudInitState::Errored),
        ("\nstatus: done\n", CloudInitState::Done),
        ("status: running\n", CloudInitState::Enabled),
        ("status: not run\n", CloudInitState::Enabled),
        ("status: something-new\n", CloudInitState::Enabled),
    ];
    for (out, want) in cases {
        let agent = FakeAgent::reporting(out);
        let snapshot = query_state(&layout, &agent).unwrap();
        assert_eq!(snapshot.state(), want, "{out:?}");
        assert!(snapshot.diagnostic().is_none());
        assert_eq!(agent.calls.get(), 1);
    }
}

#[test]
fn unparseable_or_failed_agent_is_errored_with_diagnostic() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());

    let agent = FakeAgent::reporting("garbage output\n");
    let snapshot = query_state(&layout, &agent).unwrap();
    assert_eq!(snapshot.state(), CloudInitState::Errored);
    assert_eq!(snapshot.diagnostic(), Some("garbage output\n"));

    let agent = FakeAgent::failing("status: running\nTraceback...\n");
    let snapshot = query_state(&layout, &agent).unwrap();
    assert_eq!(snapshot.state(), CloudInitState::Errored);
    assert!(snapshot.diagnostic().unwrap().contains("Traceback"));
}

#[test]
fn missing_agent_is_not_found_without_error() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    let agent = FakeAgent::missing();
    assert_eq!(state_of(&layout, &agent), CloudInitState::NotFound);
    assert_eq!(agent.calls.get(), 0);
}

#[test]
fn restrict_marker_wins_over_disable_marker() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    fs::create_dir_all(layout.cloud_cfg_dir()).unwrap();
    fs::write(layout.disabled_file(), "").unwrap();
    let agent = FakeAgent::reporting("status: done\n");
    assert_eq!(state_of(&layout, &agent), CloudInitState::DisabledPermanently);
    fs::write(layout.restrict_file(), "datasource_list: [Ec2]\n").unwrap();
    assert_eq!(state_of(&layout, &agent), CloudInitState::RestrictedBySnapd);
    assert_eq!(agent.calls.get(), 0);
}

#[test]
fn nocloud_is_pinned_and_fs_label_disabled() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    write_status_json(&layout, "DataSourceNoCloud [seed=/dev/sr0][dsmode=net]");
    let agent = FakeAgent::reporting("status: done\n");

    let out = restrict_cloud_init(&layout, &agent, RestrictOptions::default()).unwrap();
    assert_eq!(out.action, RestrictAction::Restrict);
    assert_eq!(out.datasource.as_deref(), Some("NoCloud"));

    let pin: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(layout.restrict_file()).unwrap()).unwrap();
    assert_eq!(pin["datasource_list"][0].as_str(), Some("NoCloud"));
    assert!(pin["datasource"]["NoCloud"]["fs_label"].is_null());
    assert!(pin["datasource"]["NoCloud"]
        .as_mapping()
        .unwrap()
        .contains_key("fs_label"));
    assert_eq!(pin["manual_cache_clean"].as_bool(), Some(true));

    let calls = agent.calls.get();
    assert_eq!(state_of(&layout, &agent), CloudInitState::RestrictedBySnapd);
    assert_eq!(agent.calls.get(), calls);
}

#[test]
fn cloud_datasource_gets_plain_pin() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    write_status_json(&layout, "DataSourceEc2 [seed=...]");
    let agent = FakeAgent::reporting("status: done\n");

    let opts = RestrictOptions {
        disable_local_after_first_run: true,
        ..Default::default()
    };
    let out = restrict_cloud_init(&layout, &agent, opts).unwrap();
    assert_eq!(out.action, RestrictAction::Restrict);
    assert_eq!(out.datasource.as_deref(), Some("Ec2"));
    assert_eq!(
        fs::read_to_string(layout.restrict_file()).unwrap(),
        "datasource_list: [Ec2]\n"
    );
    assert!(!layout.disabled_file().exists());
}

#[test]
fn local_datasource_disabled_when_requested() {
    for raw in ["DataSourceNone", "DataSourceNoCloud [seed=/dev/vdb]"] {
        let dir = tempdir().unwrap();
        let layout = RootLayout::new(dir.path());
        write_status_json(&layout, raw);
        let agent = FakeAgent::reporting("status: done\n");
        let opts = RestrictOptions {
            disable_local_after_first_run: true,
            ..Default::default()
        };
        let out = restrict_cloud_init(&layout, &agent, opts).unwrap();
        assert_eq!(out.action, RestrictAction::Disable, "{raw}");
        assert!(layout.disabled_file().exists());
        assert!(!layout.restrict_file().exists());
        assert_eq!(state_of(&layout, &agent), CloudInitState::DisabledPermanently);
    }
}

#[test]
fn untriggered_and_missing_agent_disable() {
    for agent in [FakeAgent::reporting("status: disabled\n"), FakeAgent::missing()] {
        let dir = tempdir().unwrap();
        let layout = RootLayout::new(dir.path());
        let out = restrict_cloud_init(&layout, &agent, RestrictOptions::default()).unwrap();
        assert_eq!(out.action, RestrictAction::Disable);
        assert_eq!(out.datasource, None);
        assert_eq!(fs::read(layout.disabled_file()).unwrap(), b"");
    }
}

#[test]
fn active_or_errored_needs_force() {
    for status in ["status: running\n", "status: error\n", "no status line\n"] {
        let dir = tempdir().unwrap();
        let layout = RootLayout::new(dir.path());
        let agent = FakeAgent::reporting(status);

        let err = restrict_cloud_init(&layout, &agent, RestrictOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict, "{status:?}");
        assert!(!layout.disabled_file().exists());

        let opts = RestrictOptions {
            force_disable: true,
            ..Default::default()
        };
        let out = restrict_cloud_init(&layout, &agent, opts).unwrap();
        assert_eq!(out.action, RestrictAction::Disable);
        assert!(layout.disabled_file().exists());
    }
}

#[test]
fn second_call_always_conflicts() {
    let setups: [(&str, Option<&str>); 3] = [
        ("status: done\n", Some("DataSourceGCE")),
        ("status: done\n", Some("DataSourceNoCloud [seed=/dev/sr0]")),
        ("status: disabled\n", None),
    ];
    for (status, datasource) in setups {
        let dir = tempdir().unwrap();
        let layout = RootLayout::new(dir.path());
        if let Some(ds) = datasource {
            write_status_json(&layout, ds);
        }
        let agent = FakeAgent::reporting(status);
        let opts = RestrictOptions {
            force_disable: true,
            ..Default::default()
        };
        restrict_cloud_init(&layout, &agent, opts).unwrap();
        let err = restrict_cloud_init(&layout, &agent, opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }
}

#[test]
fn stale_snapshot_cannot_act_twice() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    write_status_json(&layout, "DataSourceOpenStack");
    let agent = FakeAgent::reporting("status: done\n");

    let first = query_state(&layout, &agent).unwrap();
    let stale = query_state(&layout, &agent).unwrap();
    assert_eq!(stale.state(), CloudInitState::Done);

    restrict(&layout, first, RestrictOptions::default()).unwrap();
    let err = restrict(&layout, stale, RestrictOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert_eq!(
        fs::read_to_string(layout.restrict_file()).unwrap(),
        "datasource_list: [OpenStack]\n"
    );
}

#[test]
fn bad_datasource_field_never_permits_everything() {
    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    write_status_json(&layout, "ConfigDrive");
    let agent = FakeAgent::reporting("status: done\n");
    let err = restrict_cloud_init(&layout, &agent, RestrictOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    assert!(!layout.restrict_file().exists());
    assert!(!layout.disabled_file().exists());
    assert_eq!(state_of(&layout, &agent), CloudInitState::Done);
}

#[cfg(unix)]
#[test]
fn system_agent_runs_status_subcommand() {
    use cohesix_cloudinit::SystemAgent;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    let script = bin_dir.join("cloud-init");
    fs::write(
        &script,
        "#!/bin/sh\n[ \"$1\" = status ] || exit 2\necho 'status: done'\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let layout = RootLayout::new(dir.path().join("root"));
    let agent = SystemAgent::default().with_search_path(bin_dir.as_os_str());
    assert!(agent.locate().is_some());
    let snapshot = query_state(&layout, &agent).unwrap();
    assert_eq!(snapshot.state(), CloudInitState::Done);

    let empty = dir.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    let agent = SystemAgent::default().with_search_path(empty.as_os_str());
    assert_eq!(
        query_state(&layout, &agent).unwrap().state(),
        CloudInitState::NotFound
    );
}

#[cfg(unix)]
#[test]
fn marker_files_are_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let mode = |path: PathBuf| fs::metadata(path).unwrap().permissions().mode() & 0o777;

    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    write_status_json(&layout, "DataSourceEc2");
    let agent = FakeAgent::reporting("status: done\n");
    restrict_cloud_init(&layout, &agent, RestrictOptions::default()).unwrap();
    assert_eq!(mode(layout.restrict_file()), 0o644);

    let dir = tempdir().unwrap();
    let layout = RootLayout::new(dir.path());
    let agent = FakeAgent::reporting("status: disabled\n");
    restrict_cloud_init(&layout, &agent, RestrictOptions::default()).unwrap();
    assert_eq!(mode(layout.disabled_file()), 0o644);
}
