//! End-to-end dispatch behavior through `Dispatcher::handle_request`.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chain_dispatch::dispatch::{CancellationSource, ExchangeOutcome, RequestState};
use chain_dispatch::{CancellationSignal, Dispatcher, HandlerError, HttpContext, Module, RoutingStrategy};

mod common;
use common::{calls, recorded, recording_module};

async fn run(dispatcher: &Dispatcher, method: &str, path: &str) -> chain_dispatch::dispatch::Exchange {
    dispatcher
        .handle_request(HttpContext::for_request(method, path), CancellationSignal::never())
        .await
}

#[tokio::test]
async fn test_declining_module_hands_over_to_next() {
    let calls = calls();
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(recording_module("x", "/a", false, &calls))
        .module(recording_module("y", "/a", true, &calls))
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/a").await;

    assert_eq!(exchange.outcome, ExchangeOutcome::Succeeded { module: "y".into() });
    assert_eq!(recorded(&calls), vec!["x", "y"]);
    assert_eq!(exchange.context.response().body_text(), "y");
}

#[tokio::test]
async fn test_unmatched_path_gets_404() {
    let calls = calls();
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(recording_module("x", "/a", true, &calls))
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/b").await;

    assert_eq!(exchange.outcome, ExchangeOutcome::Exhausted);
    assert_eq!(exchange.context.response().status(), StatusCode::NOT_FOUND);
    assert!(exchange.context.response().body().is_empty());
    assert!(recorded(&calls).is_empty());
}

#[tokio::test]
async fn test_handler_error_becomes_500_with_message() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(Module::new("x").on_get("/a", |_ctx, _cancel| {
            Box::pin(async { Err(HandlerError::msg("boom")) })
        }))
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/a").await;

    assert_eq!(exchange.outcome, ExchangeOutcome::Faulted { module: "x".into() });
    let sink = exchange.context.response();
    assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(sink.body_text().contains("boom"));
    assert_eq!(sink.close_count(), 1);
}

#[tokio::test]
async fn test_custom_not_found_replaces_default() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(Module::new("x").on_get("/a", |_ctx, _cancel| Box::pin(async { Ok(true) })))
        .on_not_found(|ctx| {
            Box::pin(async move {
                ctx.response_mut()
                    .html_response(StatusCode::NOT_FOUND, "<p>custom missing page</p>");
            })
        })
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/zzz").await;

    assert_eq!(exchange.outcome, ExchangeOutcome::Exhausted);
    assert!(exchange
        .context
        .response()
        .body_text()
        .contains("custom missing page"));
}

#[tokio::test]
async fn test_exact_entry_beats_wildcard_entry() {
    let calls = calls();
    let (on_wildcard, on_report) = (calls.clone(), calls.clone());
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(
            Module::new("files")
                .on_get("/files/*", move |_ctx, _cancel| {
                    let calls = on_wildcard.clone();
                    Box::pin(async move {
                        calls.lock().unwrap().push("wildcard".to_string());
                        Ok(true)
                    })
                })
                .on_get("/files/report", move |_ctx, _cancel| {
                    let calls = on_report.clone();
                    Box::pin(async move {
                        calls.lock().unwrap().push("report".to_string());
                        Ok(true)
                    })
                }),
        )
        .build()
        .unwrap();

    run(&dispatcher, "GET", "/files/report").await;
    run(&dispatcher, "GET", "/files/other").await;

    assert_eq!(recorded(&calls), vec!["report", "wildcard"]);
}

#[tokio::test]
async fn test_short_circuit_for_every_position() {
    for winner in 0..4 {
        let calls = calls();
        let names = ["m0", "m1", "m2", "m3"];
        let mut builder = Dispatcher::builder(RoutingStrategy::Wildcard);
        for (i, name) in names.into_iter().enumerate() {
            builder = builder.module(recording_module(name, "/a", i == winner, &calls));
        }
        let dispatcher = builder.build().unwrap();

        run(&dispatcher, "GET", "/a").await;

        assert_eq!(recorded(&calls), names[..=winner].to_vec());
    }
}

#[tokio::test]
async fn test_modules_run_sequentially_in_order() {
    let calls = calls();
    let slow = |name: &'static str, result: bool| {
        let calls = calls.clone();
        Module::new(name).on_any("*", move |_ctx, _cancel| {
            let calls = calls.clone();
            Box::pin(async move {
                calls.lock().unwrap().push(format!("{name}:start"));
                tokio::time::sleep(Duration::from_millis(20)).await;
                calls.lock().unwrap().push(format!("{name}:end"));
                Ok(result)
            })
        })
    };

    let dispatcher = Dispatcher::builder(RoutingStrategy::Regex)
        .module(slow("first", false))
        .module(slow("second", false))
        .module(slow("third", true))
        .build()
        .unwrap();

    run(&dispatcher, "POST", "/anything").await;

    assert_eq!(
        recorded(&calls),
        vec![
            "first:start",
            "first:end",
            "second:start",
            "second:end",
            "third:start",
            "third:end"
        ]
    );
}

#[tokio::test]
async fn test_response_closed_exactly_once_on_every_path() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(
            Module::new("m")
                .on_get("/ok", |ctx, _cancel| {
                    Box::pin(async move {
                        ctx.response_mut().string_response("ok");
                        Ok(true)
                    })
                })
                .on_get("/fail", |_ctx, _cancel| {
                    Box::pin(async { Err(HandlerError::msg("fail")) })
                }),
        )
        .build()
        .unwrap();

    for path in ["/ok", "/fail", "/missing"] {
        let exchange = run(&dispatcher, "GET", path).await;
        assert_eq!(exchange.state, RequestState::Closed, "{path}");
        assert_eq!(exchange.context.response().close_count(), 1, "{path}");
    }
}

#[tokio::test]
async fn test_strategy_isolation() {
    let regex_route = || {
        Module::new("users").on_get("/users/[0-9]+", |_ctx, _cancel| Box::pin(async { Ok(true) }))
    };
    let wildcard_route = || {
        Module::new("users").on_get("/users/*", |_ctx, _cancel| Box::pin(async { Ok(true) }))
    };

    let wildcard = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(regex_route())
        .build()
        .unwrap();
    assert_eq!(run(&wildcard, "GET", "/users/42").await.outcome, ExchangeOutcome::Exhausted);

    let regex = Dispatcher::builder(RoutingStrategy::Regex)
        .module(wildcard_route())
        .build()
        .unwrap();
    assert_eq!(run(&regex, "GET", "/users/42").await.outcome, ExchangeOutcome::Exhausted);

    let regex = Dispatcher::builder(RoutingStrategy::Regex)
        .module(regex_route())
        .build()
        .unwrap();
    assert!(matches!(
        run(&regex, "GET", "/users/42").await.outcome,
        ExchangeOutcome::Succeeded { .. }
    ));
}

#[tokio::test]
async fn test_any_verb_matches_every_verb() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(Module::new("get-only").on_get("/r", |ctx, _cancel| {
            Box::pin(async move {
                ctx.response_mut().string_response("get");
                Ok(true)
            })
        }))
        .module(Module::new("any").on_any("/r", |ctx, _cancel| {
            Box::pin(async move {
                ctx.response_mut().string_response("any");
                Ok(true)
            })
        }))
        .build()
        .unwrap();

    assert_eq!(run(&dispatcher, "GET", "/r").await.context.response().body_text(), "get");
    for method in ["POST", "PUT", "DELETE", "PATCH", "PURGE"] {
        let exchange = run(&dispatcher, method, "/r").await;
        assert_eq!(exchange.context.response().body_text(), "any", "{method}");
    }
}

#[tokio::test]
async fn test_unauthorized_fault_keeps_handler_response() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(Module::new("auth").on_any("*", |ctx, _cancel| {
            Box::pin(async move {
                ctx.response_mut()
                    .standard_response_without_body(StatusCode::UNAUTHORIZED);
                Err(HandlerError::msg("missing credentials"))
            })
        }))
        .on_unhandled_exception(|ctx, _err, _cancel| {
            Box::pin(async move {
                ctx.response_mut().string_response("hook ran");
                true
            })
        })
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/secret").await;

    assert!(matches!(exchange.outcome, ExchangeOutcome::Faulted { .. }));
    assert_eq!(exchange.context.response().status(), StatusCode::UNAUTHORIZED);
    assert!(exchange.context.response().body().is_empty());
}

#[tokio::test]
async fn test_exception_hook_produces_response() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(Module::new("x").on_get("/a", |_ctx, _cancel| {
            Box::pin(async { Err(HandlerError::msg("secret detail")) })
        }))
        .on_unhandled_exception(|ctx, err, _cancel| {
            Box::pin(async move {
                let redacted = !err.to_string().is_empty();
                ctx.response_mut()
                    .json_response(StatusCode::BAD_GATEWAY, &serde_json::json!({ "redacted": redacted }))
                    .is_ok()
            })
        })
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/a").await;

    let sink = exchange.context.response();
    assert_eq!(sink.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(sink.body_text(), r#"{"redacted":true}"#);
}

#[tokio::test]
async fn test_cancellation_fault_is_contained() {
    let source = CancellationSource::new();
    let dispatcher = Arc::new(
        Dispatcher::builder(RoutingStrategy::Wildcard)
            .module(Module::new("waiter").on_get("/wait", |_ctx, cancel| {
                Box::pin(async move {
                    cancel.cancelled().await;
                    Err(HandlerError::Cancelled)
                })
            }))
            .build()
            .unwrap(),
    );

    let task = tokio::spawn({
        let dispatcher = dispatcher.clone();
        let signal = source.signal();
        async move {
            dispatcher
                .handle_request(HttpContext::for_request("GET", "/wait"), signal)
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    source.cancel();

    let exchange = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(exchange.outcome, ExchangeOutcome::Faulted { .. }));
    assert_eq!(
        exchange.context.response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_concurrent_requests_share_dispatcher() {
    let dispatcher = Arc::new(
        Dispatcher::builder(RoutingStrategy::Regex)
            .module(Module::new("echo").on_get("/echo/{word}", |ctx, _cancel| {
                Box::pin(async move {
                    let word = ctx.params().get("word").unwrap_or_default().to_string();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    ctx.response_mut().string_response(word);
                    Ok(true)
                })
            }))
            .build()
            .unwrap(),
    );

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let path = format!("/echo/w{i}");
                let exchange = dispatcher
                    .handle_request(HttpContext::for_request("GET", &path), CancellationSignal::never())
                    .await;
                (i, exchange.context.response().body_text())
            })
        })
        .collect();

    for task in tasks {
        let (i, body) = task.await.unwrap();
        assert_eq!(body, format!("w{i}"));
    }
}

#[test]
fn test_invalid_regex_fails_at_build() {
    let result = Dispatcher::builder(RoutingStrategy::Regex)
        .module(Module::new("bad").on_get("/a(", |_ctx, _cancel| Box::pin(async { Ok(true) })))
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_encoded_path_matches_decoded_route() {
    for strategy in [RoutingStrategy::Wildcard, RoutingStrategy::Regex] {
        let dispatcher = Dispatcher::builder(strategy)
            .module(Module::new("files").on_get("/files/my report", |ctx, _cancel| {
                Box::pin(async move {
                    ctx.response_mut().string_response("report");
                    Ok(true)
                })
            }))
            .build()
            .unwrap();

        let exchange = run(&dispatcher, "GET", "/files/my%20report").await;

        assert!(
            matches!(exchange.outcome, ExchangeOutcome::Succeeded { .. }),
            "{strategy}"
        );
        assert_eq!(exchange.context.response().body_text(), "report", "{strategy}");
    }
}

#[tokio::test]
async fn test_wildcard_param_keeps_request_case() {
    let dispatcher = Dispatcher::builder(RoutingStrategy::Wildcard)
        .module(Module::new("static").on_get("/static/*", |ctx, _cancel| {
            Box::pin(async move {
                let file = ctx.params().positional(0).unwrap_or_default().to_string();
                ctx.response_mut().string_response(file);
                Ok(true)
            })
        }))
        .build()
        .unwrap();

    let exchange = run(&dispatcher, "GET", "/static/CSS/Site%20Main.css").await;

    assert_eq!(exchange.context.response().body_text(), "CSS/Site Main.css");
}
