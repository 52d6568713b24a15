//! Failure modes: missing keys, cycles, failing passes, type mismatches.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use lazy_di::{service, DiError, ProviderContext, Registry};

#[tokio::test]
async fn unknown_key_is_rejected_by_name() {
    let provider = Registry::new().build();

    match provider.scope().resolve("retriever").await {
        Err(DiError::NotRegistered(key)) => assert_eq!(key, "retriever"),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn unknown_dependency_fails_the_dependent_resolution() {
    let mut registry = Registry::new();
    registry.register("svc", |ctx: ProviderContext| async move {
        let ghost = ctx.container.get("ghost");
        ctx.decorator
            .invoke(move |_args| {
                let ghost = ghost.clone();
                async move { Ok(service(ghost.downcast::<u32>().is_ok())) }
            })
            .await
    });
    let scope = registry.build().scope();

    match scope.resolve("svc").await {
        Err(DiError::NotRegistered(key)) => assert_eq!(key, "ghost"),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn self_dependency_is_a_cycle() {
    let mut registry = Registry::new();
    registry.register("narcissus", |ctx: ProviderContext| async move {
        let this = ctx.container.get("narcissus");
        ctx.decorator
            .invoke(move |_args| {
                let this = this.clone();
                async move { this.value() }
            })
            .await
    });
    let scope = registry.build().scope();

    match scope.resolve("narcissus").await {
        Err(DiError::Circular(path)) => {
            assert_eq!(path, vec!["narcissus".to_string(), "narcissus".to_string()]);
        }
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn mutual_dependencies_report_the_full_path() {
    let mut registry = Registry::new();
    registry.register("a", |ctx: ProviderContext| async move {
        let b = ctx.container.get("b");
        ctx.decorator
            .invoke(move |_args| {
                let b = b.clone();
                async move { b.value() }
            })
            .await
    });
    registry.register("b", |ctx: ProviderContext| async move {
        let a = ctx.container.get("a");
        ctx.decorator
            .invoke(move |_args| {
                let a = a.clone();
                async move { a.value() }
            })
            .await
    });
    let scope = registry.build().scope();

    match scope.resolve("a").await {
        Err(DiError::Circular(path)) => {
            assert_eq!(
                path,
                vec!["a".to_string(), "b".to_string(), "a".to_string()]
            );
        }
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn failing_real_pass_caches_nothing_and_retries() {
    let attempts = Arc::new(AtomicU32::new(0));

    let mut registry = Registry::new();
    let counter = attempts.clone();
    registry.register("flaky", move |ctx: ProviderContext| {
        let counter = counter.clone();
        async move {
            ctx.decorator
                .invoke(move |_args| {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            return Err(DiError::Provider {
                                key: "flaky".to_string(),
                                message: "connection refused".to_string(),
                            });
                        }
                        Ok(service("up".to_string()))
                    }
                })
                .await
        }
    });
    let scope = registry.build().scope();

    match scope.resolve("flaky").await {
        Err(DiError::Provider { key, message }) => {
            assert_eq!(key, "flaky");
            assert!(message.contains("refused"));
        }
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }

    // The failure was not cached; the identical call retries from scratch.
    assert_eq!(*scope.get::<String>("flaky").await.unwrap(), "up");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_discovery_pass_aborts_the_call() {
    let mut registry = Registry::new();
    registry.register("dep", |_ctx: ProviderContext| async {
        Ok(service(1u32))
    });
    registry.register("eager", |ctx: ProviderContext| async move {
        // Typed extraction outside the decorated factory runs during
        // discovery, where the handle is still a placeholder.
        let dep = ctx.container.get("dep").downcast::<u32>()?;
        ctx.decorator
            .invoke(move |_args| {
                let dep = dep.clone();
                async move { Ok(service(*dep + 1)) }
            })
            .await
    });
    let scope = registry.build().scope();

    match scope.resolve("eager").await {
        Err(DiError::Unresolved(key)) => assert_eq!(key, "dep"),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn typed_access_reports_the_expected_type() {
    let mut registry = Registry::new();
    registry.register("prefix", |_ctx: ProviderContext| async {
        Ok(service("42".to_string()))
    });
    let scope = registry.build().scope();

    match scope.get::<u32>("prefix").await {
        Err(DiError::TypeMismatch { key, expected }) => {
            assert_eq!(key, "prefix");
            assert!(expected.contains("u32"));
        }
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn real_pass_reads_must_repeat_discovery_reads() {
    let mut registry = Registry::new();
    registry.register("dep", |_ctx: ProviderContext| async {
        Ok(service(1u32))
    });
    registry.register("shifty", |ctx: ProviderContext| async move {
        // Reads only in the real pass: nothing was recorded, so the
        // sub-container cannot serve it.
        if ctx.decorator.is_discovery() {
            return Ok(service(0u32));
        }
        let dep = ctx.container.get("dep");
        ctx.decorator
            .invoke(move |_args| {
                let dep = dep.clone();
                async move { Ok(service(*dep.downcast::<u32>()?)) }
            })
            .await
    });
    let scope = registry.build().scope();

    match scope.resolve("shifty").await {
        Err(DiError::Unavailable(reason)) => assert!(reason.contains("dep")),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}
