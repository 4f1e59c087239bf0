// tests/http_routes.rs
#![cfg(unix)]

use std::error::Error;

use reqwest::StatusCode;

use hookrun::types::CommandPrecedence;
use hookrun_test_utils::builders::{ConfigFileBuilder, HookConfigBuilder};
use hookrun_test_utils::server::TestServer;
use hookrun_test_utils::{capture_logs, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn scenario_config() -> ConfigFileBuilder {
    ConfigFileBuilder::new()
        .with_hook(HookConfigBuilder::new("build").command("echo hello").build())
        .with_hook(HookConfigBuilder::new("deploy").inline("cat").build())
        .with_hook(HookConfigBuilder::new("idle").build())
}

#[tokio::test]
async fn post_runs_command_and_returns_its_output() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/build")).body("ignored").send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await?, "hello\n");
        assert_eq!(server.spawn_count(), 1);

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn inline_script_echoes_request_body() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/deploy")).body("payload").send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await?, "payload");

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn large_body_round_trips_through_stdin() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();

        let payload: Vec<u8> = (0..2 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        let resp = client
            .post(server.url("/deploy"))
            .body(payload.clone())
            .send()
            .await?;
        let echoed = resp.bytes().await?;
        assert_eq!(echoed.len(), payload.len());
        assert!(echoed[..] == payload[..], "echoed body differs from request body");

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn non_post_methods_are_rejected_without_spawning() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();

        let resp = client.get(server.url("/build")).send().await?;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.text().await?, "Method not allowed\n");

        for method in [reqwest::Method::PUT, reqwest::Method::DELETE, reqwest::Method::PATCH] {
            let resp = client.request(method, server.url("/deploy")).send().await?;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        }

        assert_eq!(server.spawn_count(), 0);
        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn liveness_route_answers_ok() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();

        let resp = client.get(server.url("/")).send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await?, "OK");

        let resp = client.post(server.url("/")).body("x").send().await?;
        assert_eq!(resp.text().await?, "OK");

        let resp = client.get(server.url("/not-a-hook")).send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await?, "OK");

        assert_eq!(server.spawn_count(), 0);
        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn hook_without_command_answers_empty() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/idle")).body("anything").send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await?, "");
        assert_eq!(server.spawn_count(), 0);

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn inline_wins_when_both_are_set() -> TestResult {
    with_timeout(async {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .with_hook(
                HookConfigBuilder::new("both")
                    .command("echo command")
                    .inline("echo inline")
                    .build(),
            )
            .build();
        let server = TestServer::start(cfg).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/both")).send().await?;
        assert_eq!(resp.text().await?, "inline\n");
        assert_eq!(server.spawn_count(), 1);

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn command_precedence_setting_is_honoured() -> TestResult {
    with_timeout(async {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .precedence(CommandPrecedence::Command)
            .with_hook(
                HookConfigBuilder::new("both")
                    .command("echo command")
                    .inline("echo inline")
                    .build(),
            )
            .build();
        let server = TestServer::start(cfg).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/both")).send().await?;
        assert_eq!(resp.text().await?, "command\n");

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn failing_command_still_returns_its_output() -> TestResult {
    with_timeout(async {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .with_hook(
                HookConfigBuilder::new("fail")
                    .inline("printf 'before exit'; echo oops >&2; exit 3")
                    .build(),
            )
            .build();
        let server = TestServer::start(cfg).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/fail")).send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = resp.text().await?;
        assert!(text.contains("before exit"), "got {text:?}");
        assert!(text.contains("oops\n"), "got {text:?}");
        assert_eq!(text.len(), "before exit".len() + "oops\n".len());

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn failing_command_logs_its_exit_code() -> TestResult {
    let (logs, _guard) = capture_logs();
    with_timeout(async {
        let cfg = ConfigFileBuilder::new()
            .with_hook(HookConfigBuilder::new("fail").inline("echo partial; exit 3").build())
            .build();
        let server = TestServer::start(cfg).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/fail")).send().await?;
        assert_eq!(resp.text().await?, "partial\n");

        // Waits for the child to be reaped and the outcome logged.
        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await?;

    let text = logs.contents();
    let failed = text
        .lines()
        .find(|line| line.contains("command failed"))
        .ok_or_else(|| format!("no failure line in logs:\n{text}"))?;
    assert!(failed.contains("WARN"), "{failed}");
    assert!(failed.contains("exit_code=3"), "{failed}");
    assert!(failed.contains("name=fail"), "{failed}");
    assert!(
        text.lines()
            .any(|line| line.contains("command finished") && line.contains("result=\"partial\\n\"")),
        "no summary line in logs:\n{text}"
    );
    Ok(())
}

#[tokio::test]
async fn unused_request_bodies_are_read_to_the_end() -> TestResult {
    with_timeout(async {
        init_tracing();
        let server = TestServer::start(scenario_config().build()).await?;
        let client = reqwest::Client::new();
        let body = vec![b'z'; 8 * 1024 * 1024];

        let resp = client.put(server.url("/build")).body(body.clone()).send().await?;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        resp.text().await?;

        let resp = client.post(server.url("/idle")).body(body).send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await?, "");

        // The same client keeps working afterwards.
        let resp = client.post(server.url("/build")).send().await?;
        assert_eq!(resp.text().await?, "hello\n");
        assert_eq!(server.spawn_count(), 1);

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn spawn_failure_is_a_server_error() -> TestResult {
    with_timeout(async {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .with_hook(
                HookConfigBuilder::new("broken")
                    .command("/nonexistent/hookrun-missing-program --flag")
                    .build(),
            )
            .with_hook(HookConfigBuilder::new("build").command("echo hello").build())
            .build();
        let server = TestServer::start(cfg).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/broken")).send().await?;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The server keeps serving other hooks.
        let resp = client.post(server.url("/build")).send().await?;
        assert_eq!(resp.text().await?, "hello\n");

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn hook_runs_in_its_workdir() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("marker.txt"), "from workdir")?;

        let workdir = dir.path().to_string_lossy().to_string();
        let cfg = ConfigFileBuilder::new()
            .with_hook(
                HookConfigBuilder::new("ci/show")
                    .workdir(&workdir)
                    .command("cat marker.txt")
                    .build(),
            )
            .build();
        let server = TestServer::start(cfg).await?;
        let client = reqwest::Client::new();

        let resp = client.post(server.url("/ci/show")).send().await?;
        assert_eq!(resp.text().await?, "from workdir");

        server.stop().await?;
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}
