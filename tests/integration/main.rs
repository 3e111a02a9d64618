//! Integration tests for appshell

mod lifecycle_tests {
    use appshell::controller::{RevalidationOutcome, ServedFrom, ServingPolicy};
    use appshell::http::{Method, Request, RequestKey, Response};
    use appshell::manifest::{parse_scope, AssetManifest, VersionTag};
    use appshell::network::ScriptedNetwork;
    use appshell::registration::Registration;
    use appshell::store::{BucketMeta, BucketStore, DiskStore, MemoryStore};
    use appshell::{AppShellError, AppShellResult};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    const SCOPE: &str = "http://localhost:8080/";

    struct Fixture {
        name: &'static str,
        store: Arc<dyn BucketStore>,
        net: Arc<ScriptedNetwork>,
        _dir: Option<TempDir>,
    }

    impl Fixture {
        fn registration(&self) -> Registration {
            Registration::new(scope(), self.store.clone(), self.net.clone())
        }
    }

    /// One fixture per store implementation, each with the v1/v2 origin
    async fn fixtures() -> Vec<Fixture> {
        fixtures_with(ScriptedNetwork::new).await
    }

    async fn fixtures_with(network: impl Fn() -> ScriptedNetwork) -> Vec<Fixture> {
        let dir = TempDir::new().unwrap();
        let disk = DiskStore::open(dir.path().join("store")).await.unwrap();

        vec![
            Fixture {
                name: "memory",
                store: Arc::new(MemoryStore::new()),
                net: routed(network()),
                _dir: None,
            },
            Fixture {
                name: "disk",
                store: Arc::new(disk),
                net: routed(network()),
                _dir: Some(dir),
            },
        ]
    }

    fn origin() -> Arc<ScriptedNetwork> {
        routed(ScriptedNetwork::new())
    }

    fn routed(net: ScriptedNetwork) -> Arc<ScriptedNetwork> {
        net.route(&url("/"), Response::ok("<html>shell</html>"));
        net.route(&url("/index.html"), Response::ok("<html>index</html>"));
        net.route(&url("/app.js"), Response::ok("console.log(1)"));
        net.route(&url("/icon.png"), Response::ok(vec![0x89, b'P', b'N', b'G']));
        Arc::new(net)
    }

    fn scope() -> Url {
        parse_scope(SCOPE).unwrap()
    }

    fn url(path: &str) -> Url {
        scope().join(path).unwrap()
    }

    fn tag(version: &str) -> VersionTag {
        VersionTag::new(version).unwrap()
    }

    fn manifest(version: &str, paths: &[&str]) -> AssetManifest {
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        AssetManifest::new(tag(version), &scope(), &paths).unwrap()
    }

    fn v1() -> AssetManifest {
        manifest("v1", &["/", "/index.html", "/app.js"])
    }

    fn v2() -> AssetManifest {
        manifest("v2", &["/", "/index.html", "/app.js", "/icon.png"])
    }

    #[tokio::test]
    async fn example_scenario_v1_to_v2() {
        for f in fixtures().await {
            let registration = f.registration();
            let client = registration.register_client().await;

            registration.update(v1(), ServingPolicy::CacheFirst).await.unwrap();
            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v1")], "{}", f.name);

            let report = registration.update(v2(), ServingPolicy::CacheFirst).await.unwrap();
            assert_eq!(report.promotion.activation.deleted, vec![tag("v1")], "{}", f.name);
            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v2")], "{}", f.name);

            f.net.reset_calls();
            let served = registration
                .fetch(client, Request::get(url("/icon.png")))
                .await
                .unwrap();
            assert_eq!(served.source, ServedFrom::Cache, "{}", f.name);
            assert_eq!(served.response.body, vec![0x89, b'P', b'N', b'G']);
            assert_eq!(f.net.calls(), 0, "{}", f.name);
        }
    }

    #[tokio::test]
    async fn atomic_install_keeps_previous_release() {
        for f in fixtures().await {
            let registration = f.registration();
            let client = registration.register_client().await;
            registration.update(v1(), ServingPolicy::CacheFirst).await.unwrap();

            f.net.fail(&url("/icon.png"));
            let err = registration
                .update(v2(), ServingPolicy::CacheFirst)
                .await
                .unwrap_err();
            assert!(matches!(err, AppShellError::InstallFailed { .. }), "{}", f.name);

            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v1")], "{}", f.name);
            assert_eq!(registration.active_version().await, Some(tag("v1")));

            f.net.set_offline(true);
            for path in ["/", "/index.html", "/app.js"] {
                let served = registration
                    .fetch(client, Request::get(url(path)))
                    .await
                    .unwrap();
                assert_eq!(served.source, ServedFrom::Cache, "{} {}", f.name, path);
            }
        }
    }

    #[tokio::test]
    async fn non_success_status_fails_install() {
        for f in fixtures().await {
            let registration = f.registration();
            f.net.unroute(&url("/app.js"));

            let err = registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap_err();
            assert!(matches!(err, AppShellError::InstallFailed { .. }), "{}", f.name);
            assert!(f.store.bucket_tags().await.unwrap().is_empty(), "{}", f.name);
        }
    }

    #[tokio::test]
    async fn activation_leaves_single_bucket() {
        for f in fixtures().await {
            let registration = f.registration();
            registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();
            registration
                .install(manifest("v1b", &["/"]), ServingPolicy::CacheFirst)
                .await
                .unwrap();
            registration.install(v2(), ServingPolicy::CacheFirst).await.unwrap();
            assert_eq!(f.store.bucket_tags().await.unwrap().len(), 3, "{}", f.name);

            registration.activate().await.unwrap();
            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v2")], "{}", f.name);
            assert_eq!(f.store.active_tag().await.unwrap(), Some(tag("v2")), "{}", f.name);
        }
    }

    #[tokio::test]
    async fn cache_first_hits_never_reach_network() {
        for f in fixtures().await {
            let registration = f.registration();
            registration.update(v1(), ServingPolicy::CacheFirst).await.unwrap();
            let client = registration.register_client().await;
            f.net.reset_calls();

            for _ in 0..5 {
                let served = registration
                    .fetch(client, Request::get(url("/app.js")))
                    .await
                    .unwrap();
                assert_eq!(served.source, ServedFrom::Cache);
                assert_eq!(served.response.body, b"console.log(1)");
                assert!(served.revalidation.is_none());
            }
            assert_eq!(f.net.calls(), 0, "{}", f.name);
        }
    }

    #[tokio::test]
    async fn stale_while_revalidate_converges() {
        for f in fixtures().await {
            let registration = f.registration();
            registration
                .update(v1(), ServingPolicy::StaleWhileRevalidate)
                .await
                .unwrap();
            let client = registration.register_client().await;

            f.net.route(&url("/app.js"), Response::ok("console.log(2)"));

            let mut first = registration
                .fetch(client, Request::get(url("/app.js")))
                .await
                .unwrap();
            assert_eq!(first.source, ServedFrom::Cache, "{}", f.name);
            assert_eq!(first.response.body, b"console.log(1)");
            assert_eq!(first.settle().await, Some(RevalidationOutcome::Stored));

            let mut second = registration
                .fetch(client, Request::get(url("/app.js")))
                .await
                .unwrap();
            assert_eq!(second.response.body, b"console.log(2)", "{}", f.name);
            second.settle().await;
        }
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_the_last_write() {
        let latency = Duration::from_millis(150);
        for f in fixtures_with(|| ScriptedNetwork::new().with_latency(latency)).await {
            let registration = f.registration();
            registration
                .update(v1(), ServingPolicy::StaleWhileRevalidate)
                .await
                .unwrap();
            let client = registration.register_client().await;

            f.net.route(&url("/app.js"), Response::ok("console.log(2)"));
            let mut first = registration
                .fetch(client, Request::get(url("/app.js")))
                .await
                .unwrap();

            tokio::time::sleep(latency / 2).await;
            f.net.route(&url("/app.js"), Response::ok("console.log(3)"));
            let mut second = registration
                .fetch(client, Request::get(url("/app.js")))
                .await
                .unwrap();

            // Both answers come from the bucket while the refreshes are in flight
            assert_eq!(first.response.body, b"console.log(1)", "{}", f.name);
            assert_eq!(second.response.body, b"console.log(1)", "{}", f.name);

            assert_eq!(first.settle().await, Some(RevalidationOutcome::Stored));
            assert_eq!(second.settle().await, Some(RevalidationOutcome::Stored));

            let key = Request::get(url("/app.js")).key();
            let stored = f.store.get(&tag("v1"), &key).await.unwrap().unwrap();
            assert_eq!(stored.body, b"console.log(3)", "{}", f.name);
        }
    }

    #[tokio::test]
    async fn refresh_landing_after_activation_does_not_revive_old_bucket() {
        for f in fixtures().await {
            let registration = f.registration();
            registration
                .update(v1(), ServingPolicy::StaleWhileRevalidate)
                .await
                .unwrap();
            let client = registration.register_client().await;

            f.net.set_latency(Some(Duration::from_millis(200)));
            let mut stale = registration
                .fetch(client, Request::get(url("/index.html")))
                .await
                .unwrap();
            assert_eq!(stale.source, ServedFrom::Cache, "{}", f.name);

            // Let the refresh reach the network before the origin speeds up
            tokio::time::sleep(Duration::from_millis(20)).await;
            f.net.set_latency(None);
            registration.update(v2(), ServingPolicy::StaleWhileRevalidate).await.unwrap();
            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v2")], "{}", f.name);

            assert!(matches!(
                stale.settle().await,
                Some(RevalidationOutcome::Failed(_))
            ));
            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v2")], "{}", f.name);
            assert_eq!(registration.controller_of(client).unwrap(), Some(tag("v2")));
        }
    }

    #[tokio::test]
    async fn stale_while_revalidate_miss_waits_for_network() {
        for f in fixtures().await {
            let registration = f.registration();
            registration
                .update(manifest("v1", &["/"]), ServingPolicy::StaleWhileRevalidate)
                .await
                .unwrap();
            let client = registration.register_client().await;

            let mut served = registration
                .fetch(client, Request::get(url("/icon.png")))
                .await
                .unwrap();
            assert_eq!(served.source, ServedFrom::Network, "{}", f.name);
            assert_eq!(served.response.body, vec![0x89, b'P', b'N', b'G']);
            served.settle().await;

            f.net.set_offline(true);
            let offline = registration
                .fetch(client, Request::get(url("/icon.png")))
                .await
                .unwrap();
            assert_eq!(offline.source, ServedFrom::Cache, "{}", f.name);
        }
    }

    #[tokio::test]
    async fn offline_miss_propagates_failure() {
        for f in fixtures().await {
            let registration = f.registration();
            registration
                .update(manifest("v1", &["/"]), ServingPolicy::StaleWhileRevalidate)
                .await
                .unwrap();
            let client = registration.register_client().await;
            f.net.set_offline(true);

            let err = registration
                .fetch(client, Request::get(url("/missing.css")))
                .await
                .unwrap_err();
            assert!(matches!(err, AppShellError::Network { .. }), "{}", f.name);
        }
    }

    #[tokio::test]
    async fn revalidation_failure_keeps_stale_entry() {
        for f in fixtures().await {
            let registration = f.registration();
            registration
                .update(v1(), ServingPolicy::StaleWhileRevalidate)
                .await
                .unwrap();
            let client = registration.register_client().await;
            f.net.set_offline(true);

            let mut served = registration
                .fetch(client, Request::get(url("/index.html")))
                .await
                .unwrap();
            assert_eq!(served.response.body, b"<html>index</html>");
            assert!(matches!(
                served.settle().await,
                Some(RevalidationOutcome::Failed(_))
            ));

            let again = registration
                .fetch(client, Request::get(url("/index.html")))
                .await
                .unwrap();
            assert_eq!(again.response.body, b"<html>index</html>", "{}", f.name);
        }
    }

    #[tokio::test]
    async fn scope_restriction_bypasses_buckets() {
        for policy in [ServingPolicy::CacheFirst, ServingPolicy::StaleWhileRevalidate] {
            for f in fixtures().await {
                let registration = f.registration();
                registration.update(v1(), policy).await.unwrap();
                let client = registration.register_client().await;

                f.net
                    .route_method(Method::Post, &url("/index.html"), Response::new(201, "created"));
                let foreign = Url::parse("http://cdn.example.com/index.html").unwrap();
                f.net.route(&foreign, Response::ok("from cdn"));
                f.net.reset_calls();

                let post = registration
                    .fetch(
                        client,
                        Request::new(Method::Post, url("/index.html")).with_body("card"),
                    )
                    .await
                    .unwrap();
                assert_eq!(post.source, ServedFrom::Passthrough, "{} {}", f.name, policy);
                assert_eq!(post.response.status, 201);

                let cross = registration
                    .fetch(client, Request::get(foreign.clone()))
                    .await
                    .unwrap();
                assert_eq!(cross.source, ServedFrom::Passthrough, "{} {}", f.name, policy);
                assert_eq!(cross.response.body, b"from cdn");

                assert_eq!(f.net.calls(), 2, "{} {}", f.name, policy);
                assert!(f
                    .store
                    .get(&tag("v1"), &RequestKey::new(Method::Get, &foreign))
                    .await
                    .unwrap()
                    .is_none());
            }
        }
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        for f in fixtures().await {
            let registration = f.registration();
            let first = registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();
            let keys_before = f.store.entry_keys(&tag("v1")).await.unwrap();

            let second = registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();
            let keys_after = f.store.entry_keys(&tag("v1")).await.unwrap();

            assert!(!first.reinstalled);
            assert!(second.reinstalled);
            assert!(second.changed.is_empty(), "{}", f.name);
            assert_eq!(keys_before, keys_after, "{}", f.name);
            assert_eq!(keys_after.len(), 3);
            assert_eq!(f.store.bucket_tags().await.unwrap(), vec![tag("v1")]);

            for key in &keys_after {
                let response = f.store.get(&tag("v1"), key).await.unwrap().unwrap();
                assert!(response.is_success());
            }
        }
    }

    #[tokio::test]
    async fn changed_manifest_requires_new_version() {
        for f in fixtures().await {
            let registration = f.registration();
            registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();

            let err = registration
                .install(manifest("v1", &["/", "/index.html"]), ServingPolicy::CacheFirst)
                .await
                .unwrap_err();
            assert!(matches!(err, AppShellError::VersionNotBumped { .. }), "{}", f.name);
            assert_eq!(f.store.entry_keys(&tag("v1")).await.unwrap().len(), 3);
        }
    }

    #[tokio::test]
    async fn changed_bytes_are_reported_on_reinstall() {
        for f in fixtures().await {
            let registration = f.registration();
            registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();

            f.net.route(&url("/app.js"), Response::ok("console.log(2)"));
            let report = registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();
            assert_eq!(report.changed, vec![url("/app.js")], "{}", f.name);
        }
    }

    #[tokio::test]
    async fn disk_store_survives_relaunch() {
        let dir = TempDir::new().unwrap();
        let net = origin();

        {
            let store = DiskStore::open(dir.path()).await.unwrap();
            let registration = Registration::new(scope(), Arc::new(store), net.clone());
            registration.update(v1(), ServingPolicy::CacheFirst).await.unwrap();
        }

        let store = DiskStore::open(dir.path()).await.unwrap();
        let registration = Registration::new(scope(), Arc::new(store), net.clone());
        assert_eq!(registration.restore().await.unwrap(), Some(tag("v1")));

        net.set_offline(true);
        net.reset_calls();
        let client = registration.register_client().await;
        let served = registration
            .fetch(client, Request::get(url("/index.html")))
            .await
            .unwrap();
        assert_eq!(served.source, ServedFrom::Cache);
        assert_eq!(served.response.body, b"<html>index</html>");
        assert_eq!(net.calls(), 0);
    }

    #[tokio::test]
    async fn version_named_like_store_file_leaves_current_release() {
        let dir = TempDir::new().unwrap();
        let net = origin();

        {
            let store = DiskStore::open(dir.path()).await.unwrap();
            let registration = Registration::new(scope(), Arc::new(store), net.clone());
            registration.update(v1(), ServingPolicy::CacheFirst).await.unwrap();
            registration
                .install(manifest("active.json", &["/", "/index.html"]), ServingPolicy::CacheFirst)
                .await
                .unwrap();
            assert_eq!(registration.active_version().await, Some(tag("v1")));
        }

        let store = Arc::new(DiskStore::open(dir.path()).await.unwrap());
        assert_eq!(store.active_tag().await.unwrap(), Some(tag("v1")));
        assert_eq!(
            store.bucket_tags().await.unwrap(),
            vec![tag("active.json"), tag("v1")]
        );

        let registration = Registration::new(scope(), store.clone(), net.clone());
        assert_eq!(registration.restore().await.unwrap(), Some(tag("v1")));

        registration.activate_installed(&tag("active.json")).await.unwrap();
        assert_eq!(store.bucket_tags().await.unwrap(), vec![tag("active.json")]);
        assert_eq!(store.active_tag().await.unwrap(), Some(tag("active.json")));
    }

    /// Store whose deletes fail for one tag
    struct StickyStore {
        inner: MemoryStore,
        sticky: VersionTag,
    }

    #[async_trait]
    impl BucketStore for StickyStore {
        async fn bucket_tags(&self) -> AppShellResult<Vec<VersionTag>> {
            self.inner.bucket_tags().await
        }

        async fn bucket_meta(&self, tag: &VersionTag) -> AppShellResult<Option<BucketMeta>> {
            self.inner.bucket_meta(tag).await
        }

        async fn commit_bucket(
            &self,
            meta: BucketMeta,
            entries: Vec<(RequestKey, Response)>,
        ) -> AppShellResult<()> {
            self.inner.commit_bucket(meta, entries).await
        }

        async fn get(
            &self,
            tag: &VersionTag,
            key: &RequestKey,
        ) -> AppShellResult<Option<Response>> {
            self.inner.get(tag, key).await
        }

        async fn put(
            &self,
            tag: &VersionTag,
            key: &RequestKey,
            response: &Response,
        ) -> AppShellResult<()> {
            self.inner.put(tag, key, response).await
        }

        async fn entry_keys(&self, tag: &VersionTag) -> AppShellResult<Vec<RequestKey>> {
            self.inner.entry_keys(tag).await
        }

        async fn delete_bucket(&self, tag: &VersionTag) -> AppShellResult<bool> {
            if tag == &self.sticky {
                return Err(AppShellError::Store("permission denied".to_string()));
            }
            self.inner.delete_bucket(tag).await
        }

        async fn active_tag(&self) -> AppShellResult<Option<VersionTag>> {
            self.inner.active_tag().await
        }

        async fn set_active_tag(&self, tag: Option<&VersionTag>) -> AppShellResult<()> {
            self.inner.set_active_tag(tag).await
        }
    }

    #[tokio::test]
    async fn delete_failure_does_not_block_activation() {
        let store = Arc::new(StickyStore {
            inner: MemoryStore::new(),
            sticky: tag("v1"),
        });
        let net = origin();
        let registration = Registration::new(scope(), store.clone(), net.clone());

        registration.install(v1(), ServingPolicy::CacheFirst).await.unwrap();
        registration
            .install(manifest("v1b", &["/"]), ServingPolicy::CacheFirst)
            .await
            .unwrap();
        let report = registration.update(v2(), ServingPolicy::CacheFirst).await.unwrap();

        let activation = report.promotion.activation;
        assert_eq!(activation.deleted, vec![tag("v1b")]);
        assert_eq!(activation.failed.len(), 1);
        assert_eq!(activation.failed[0].0, tag("v1"));
        assert_eq!(registration.active_version().await, Some(tag("v2")));

        let client = registration.register_client().await;
        net.reset_calls();
        let served = registration
            .fetch(client, Request::get(url("/icon.png")))
            .await
            .unwrap();
        assert_eq!(served.source, ServedFrom::Cache);
        assert_eq!(net.calls(), 0);
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn appshell() -> Command {
        cargo_bin_cmd!("appshell")
    }

    /// Config file pointing the bucket store into a temp dir
    fn sandbox() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let store = dir.path().join("store");
        std::fs::write(
            &config,
            format!(
                "[general]\naudit_log = false\n\n[controller]\nscope = \"http://127.0.0.1:9/cards/\"\n\n[store]\ndir = {:?}\n",
                store.display().to_string()
            ),
        )
        .unwrap();
        (dir, config)
    }

    #[test]
    fn help_displays() {
        appshell()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline app-shell cache"));
    }

    #[test]
    fn version_displays() {
        appshell()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("appshell"));
    }

    #[test]
    fn config_path() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[controller]"))
            .stdout(predicate::str::contains("http://127.0.0.1:9/cards/"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn manifest_prints_builtin_release() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "manifest", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("http://127.0.0.1:9/cards/index.html"))
            .stdout(predicate::str::contains("script.js?v=34"));
    }

    #[test]
    fn manifest_json_has_fingerprint() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "manifest", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"fingerprint\""))
            .stdout(predicate::str::contains("flashcards-v34-idb"));
    }

    #[test]
    fn buckets_empty() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "buckets", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn status_reports_no_release() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No current release"));
    }

    #[test]
    fn activate_unknown_version() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "activate", "v9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Version not installed"));
    }

    #[test]
    fn offline_fetch_without_release_fails() {
        let (_dir, config) = sandbox();
        appshell()
            .args(["--config", config.to_str().unwrap(), "fetch", "index.html", "--offline"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("offline"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[controller\n").unwrap();
        appshell()
            .args(["--config", config.to_str().unwrap(), "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
