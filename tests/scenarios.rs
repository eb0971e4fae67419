//! End-to-end dispatch scenarios, driven without a socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};

use ssr_engine::component::{el, text, Node};
use ssr_engine::html::{render_to_string, VNode};
use ssr_engine::http::Body;
use ssr_engine::{
    AppBuilder, AppConfig, DispatchError, RenderError, Reply, RequestContext, Response, RouteError,
    Template,
};

mod common;
use common::{bare_config, heading_page, Log};

#[test]
fn scenario_a_parameter_extraction() {
    let mut app = AppBuilder::new(bare_config());
    app.get("/users/:id", |ctx| {
        Ok(Reply::text(format!(
            "{}|{}",
            ctx.route().unwrap_or_default(),
            ctx.param("id").unwrap_or_default()
        )))
    })
    .unwrap();
    let app = app.build();

    let res = app.dispatch(RequestContext::get("/users/42")).unwrap();
    assert_eq!(res.body, Body::Text("/users/:id|42".into()));

    let res = app.dispatch(RequestContext::get("/users/42/")).unwrap();
    assert_eq!(res.body, Body::Text("/users/:id|42".into()));

    let res = app.dispatch(RequestContext::get("/users/42/posts")).unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[test]
fn scenario_b_text_is_escaped_raw_is_not() {
    let payload = "<script>alert(1)</script>";
    assert_eq!(
        render_to_string(&VNode::text(payload)),
        "&lt;script&gt;alert(1)&lt;/script&gt;"
    );
    assert_eq!(render_to_string(&VNode::raw(payload)), payload);

    let mut app = AppBuilder::new(bare_config());
    app.get("/", move |_ctx| {
        Ok(Reply::page(Template::new("xss", (), move |_| -> Result<Node, RenderError> {
            Ok(el("p").child(payload).into())
        })))
    })
    .unwrap();
    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(
        res.html_body(),
        Some("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>")
    );
}

#[test]
fn scenario_c_exact_beats_parameterized() {
    let mut app = AppBuilder::new(bare_config());
    // parameterized registered first on purpose
    app.get("/:page", |ctx| Ok(Reply::text(format!("page:{}", ctx.param("page").unwrap_or_default()))))
        .unwrap()
        .get("/about", |_ctx| Ok(Reply::text("about")))
        .unwrap();
    let app = app.build();

    let res = app.dispatch(RequestContext::get("/about")).unwrap();
    assert_eq!(res.body, Body::Text("about".into()));

    let res = app.dispatch(RequestContext::get("/contact")).unwrap();
    assert_eq!(res.body, Body::Text("page:contact".into()));
}

#[test]
fn scenario_d_short_circuit() {
    let log = Log::default();
    let mut app = AppBuilder::new(bare_config());

    let (a, b, c, h) = (log.clone(), log.clone(), log.clone(), log.clone());
    app.use_fn("A", move |ctx, next| {
        a.push("A");
        next.run(ctx)
    })
    .use_fn("B", move |_ctx, _next| {
        b.push("B");
        Ok(Response::error(StatusCode::UNAUTHORIZED, "login required"))
    })
    .use_fn("C", move |ctx, next| {
        c.push("C");
        next.run(ctx)
    });
    app.get("/", move |_ctx| {
        h.push("handler");
        Ok(Reply::text("never"))
    })
    .unwrap();

    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(log.entries(), vec!["A", "B"]);
}

#[test]
fn scenario_e_hydration_splice() {
    struct Fixed;
    impl ssr_engine::dispatch::ScriptGenerator for Fixed {
        fn bootstrap(
            &self,
            _state: &serde_json::Map<String, serde_json::Value>,
            _scripts: &ssr_engine::dispatch::ScriptBag,
        ) -> Result<String, DispatchError> {
            Ok("X".to_string())
        }
    }

    let mut app = AppBuilder::new(bare_config());
    app.script_generator(Fixed);
    app.get("/", |_ctx| Ok(Reply::page(heading_page("Hi")))).unwrap();

    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(res.html_body(), Some("<body><h1>Hi</h1>X</body>"));
}

#[test]
fn middleware_order_matches_registration() {
    let log = Log::default();
    let mut app = AppBuilder::new(bare_config());
    for name in ["first", "second", "third"] {
        let log = log.clone();
        app.use_fn(name, move |ctx, next| {
            log.push(format!("{}:before", name));
            let res = next.run(ctx);
            log.push(format!("{}:after", name));
            res
        });
    }
    let h = log.clone();
    app.get("/", move |_ctx| {
        h.push("handler");
        Ok(Reply::text("ok"))
    })
    .unwrap();

    app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(
        log.entries(),
        vec![
            "first:before",
            "second:before",
            "third:before",
            "handler",
            "third:after",
            "second:after",
            "first:after",
        ]
    );
}

#[test]
fn scoped_middleware_only_under_prefix() {
    let log = Log::default();
    let mut app = AppBuilder::new(bare_config());
    let l = log.clone();
    app.use_scoped_fn("/admin", "admin_guard", move |ctx, next| {
        l.push(ctx.path().to_string());
        next.run(ctx)
    });
    app.get("/admin/users", |_ctx| Ok(Reply::text("users")))
        .unwrap()
        .get("/administrator", |_ctx| Ok(Reply::text("lookalike")))
        .unwrap()
        .get("/", |_ctx| Ok(Reply::text("home")))
        .unwrap();
    let app = app.build();

    for path in ["/", "/administrator", "/admin/users"] {
        assert_eq!(app.dispatch(RequestContext::get(path)).unwrap().status, StatusCode::OK);
    }
    assert_eq!(log.entries(), vec!["/admin/users"]);
}

#[test]
fn middleware_error_reaches_boundary() {
    let log = Log::default();
    let mut app = AppBuilder::new(bare_config());
    let l = log.clone();
    app.use_fn("auth", |_ctx, _next| Err(DispatchError::middleware("auth", "token store offline")))
        .use_fn("after", move |ctx, next| {
            l.push("after");
            next.run(ctx)
        })
        .error_boundary(|err, _ctx| Response::error(StatusCode::SERVICE_UNAVAILABLE, err.to_string()));
    app.get("/", |_ctx| Ok(Reply::text("ok"))).unwrap();

    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.body,
        Body::Text("middleware `auth` failed: token store offline".into())
    );
    assert!(log.entries().is_empty());
}

#[test]
fn pre_render_failure_skips_post_render() {
    let log = Log::default();
    let mut app = AppBuilder::new(bare_config());
    let l = log.clone();
    app.get("/", move |_ctx| {
        let post = l.clone();
        Ok(Reply::page(
            Template::new("broken", (), |_| -> Result<Node, RenderError> { Ok(text("unreachable")) })
                .on_pre_render(|_, _| Err(RenderError::component("broken", "no data")))
                .on_post_render(move |_, _| {
                    post.push("post");
                    Ok(())
                }),
        ))
    })
    .unwrap();
    app.error_boundary(|err, _ctx| Response::error(err.status(), err.to_string()));

    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.body,
        Body::Text("render failed: component `broken` failed: no data".into())
    );
    assert!(log.entries().is_empty());
}

#[test]
fn void_element_with_children_fails_render() {
    let mut app = AppBuilder::new(bare_config());
    app.get("/", |_ctx| {
        Ok(Reply::page(Template::new("bad", (), |_| -> Result<Node, RenderError> {
            Ok(el("br").child("oops").into())
        })))
    })
    .unwrap();

    let err = app.build().dispatch(RequestContext::get("/")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "render failed: void element <br> cannot have children"
    );
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut app = AppBuilder::default();
    app.get("/about", |_ctx| Ok(Reply::text("a"))).unwrap();
    let err = app.get("/about/", |_ctx| Ok(Reply::text("b"))).err().unwrap();
    assert_eq!(
        err,
        RouteError::Conflict {
            method: Method::GET,
            path: "/about".into()
        }
    );

    // same path, different method is fine
    assert!(app.post("/about", |_ctx| Ok(Reply::text("c"))).is_ok());

    app.get("/users/:id", |_ctx| Ok(Reply::text("a"))).unwrap();
    assert!(app.get("/users/:name", |_ctx| Ok(Reply::text("b"))).is_err());
}

#[test]
fn cache_hit_is_identical_and_skips_lifecycle() {
    let renders = Arc::new(AtomicUsize::new(0));
    let mut app = AppBuilder::new(bare_config());
    let counter = renders.clone();
    app.get("/users/:id", move |ctx| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        let counter = counter.clone();
        Ok(Reply::page(
            Template::new("user", id, |id: &String| -> Result<Node, RenderError> {
                Ok(el("body").child(el("h1").child(format!("user {}", id))).into())
            })
            .on_pre_render(move |id, ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.provide_state("id", id.as_str());
                Ok(())
            })
            .cache_for(Duration::from_secs(60)),
        ))
    })
    .unwrap();
    let app = app.build();

    let first = app.dispatch(RequestContext::get("/users/1")).unwrap();
    let second = app.dispatch(RequestContext::get("/users/1")).unwrap();
    let other = app.dispatch(RequestContext::get("/users/2")).unwrap();

    assert_eq!(first.html_body(), second.html_body());
    assert_eq!(first.header("content-type"), second.header("content-type"));
    assert!(first.html_body().unwrap().contains(r#"{"id":"1"}"#));
    assert!(other.html_body().unwrap().contains("user 2"));
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(app.cache().map(|c| c.len()), Some(2));
}

#[test]
fn cache_hit_uses_current_request_state() {
    let renders = Arc::new(AtomicUsize::new(0));
    let mut app = AppBuilder::new(bare_config());
    app.use_fn("viewer", |ctx, next| {
        let viewer = ctx.header("x-user").unwrap_or("anonymous").to_string();
        ctx.provide_state("viewer", viewer);
        next.run(ctx)
    });
    let counter = renders.clone();
    app.get("/", move |_ctx| {
        let counter = counter.clone();
        Ok(Reply::page(
            Template::new("shared", (), |_| -> Result<Node, RenderError> {
                Ok(el("body").child("hi").into())
            })
            .on_pre_render(move |_, ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.provide_state("theme", "dark");
                Ok(())
            })
            .with_mount_script("mountShared()")
            .cache_for(Duration::from_secs(60)),
        ))
    })
    .unwrap();
    let app = app.build();

    let alice = app
        .dispatch(RequestContext::get("/").with_header("x-user", "alice"))
        .unwrap();
    let bob = app
        .dispatch(RequestContext::get("/").with_header("x-user", "bob"))
        .unwrap();

    let alice = alice.html_body().unwrap();
    let bob = bob.html_body().unwrap();
    assert!(alice.contains(r#""viewer":"alice""#));
    assert!(bob.contains(r#""viewer":"bob""#));
    assert!(!bob.contains("alice"));

    // the render ran once; its own state and scripts come back on the hit
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert!(bob.contains(r#""theme":"dark""#));
    assert_eq!(bob.matches("mountShared()").count(), 1);
    assert!(bob.starts_with("<body>hi<script"));
    assert!(bob.ends_with("</script></body>"));
}

#[test]
fn zero_duration_is_never_cached() {
    let renders = Arc::new(AtomicUsize::new(0));
    let mut app = AppBuilder::new(bare_config());
    let counter = renders.clone();
    app.get("/", move |_ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::page(heading_page("fresh")))
    })
    .unwrap();
    let app = app.build();

    app.dispatch(RequestContext::get("/")).unwrap();
    app.dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(app.cache().map(|c| c.len()), Some(0));
}

#[test]
fn document_shell_with_head_hooks() {
    let mut app = AppBuilder::new(AppConfig::default());
    app.get("/", |_ctx| {
        Ok(Reply::page(
            Template::new("home", (), |_| -> Result<Node, RenderError> {
                Ok(el("h1").child("Hello").into())
            })
            .with_title("Home & away")
            .with_meta_description("demo")
            .with_mount_script("mounted()"),
        ))
    })
    .unwrap();

    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(
        res.html_body(),
        Some(concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
            "<title>Home &amp; away</title><meta name=\"description\" content=\"demo\">",
            "</head><body><h1>Hello</h1><script>mounted()</script></body></html>"
        ))
    );
}

#[test]
fn page_that_is_already_a_document_is_not_wrapped() {
    let mut app = AppBuilder::new(AppConfig::default());
    app.get("/", |_ctx| {
        Ok(Reply::page(Template::new("doc", (), |_| -> Result<Node, RenderError> {
            Ok(el("html").child(el("body").child("x")).into())
        })))
    })
    .unwrap();

    let res = app.build().dispatch(RequestContext::get("/")).unwrap();
    assert_eq!(res.html_body(), Some("<html><body>x</body></html>"));
}

#[test]
fn stock_middleware_sets_headers() {
    let mut app = AppBuilder::new(bare_config());
    app.use_stock_middleware();
    app.get("/", |_ctx| Ok(Reply::text("ok"))).unwrap();

    let res = app
        .build()
        .dispatch(RequestContext::get("/").with_header("x-request-id", "trace-1"))
        .unwrap();
    assert_eq!(res.header("x-request-id"), Some("trace-1"));
    assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
}
