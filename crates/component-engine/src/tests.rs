#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::scope::*;
    use crate::*;

    fn text(rt: &Runtime, id: InstanceId) -> String {
        rt.output(id).unwrap().unwrap_or_default().text_content()
    }

    type Shared<T> = Rc<RefCell<T>>;

    fn counter(setter: Shared<Option<StateSetter<i32>>>) -> Component {
        Component::from_fn("Counter", Properties::new(), move |_| {
            let (count, set) = use_state(10);
            *setter.borrow_mut() = Some(set);
            Ok(Node::text(count.to_string()))
        })
    }

    fn recorder(name: &'static str, log: Shared<Vec<&'static str>>) -> Component {
        Component::from_fn(name, Properties::new(), move |_| {
            log.borrow_mut().push(name);
            Ok(Node::Empty)
        })
    }

    #[test]
    fn test_state_persists_across_renders() {
        let setter: Shared<Option<StateSetter<i32>>> = Rc::default();
        let rt = Runtime::new();
        let id = rt.mount(counter(setter.clone())).unwrap();
        assert_eq!(text(&rt, id), "10");

        let set = setter.borrow().clone().unwrap();
        assert!(!set.is_detached());
        set.set(11);
        assert!(rt.is_dirty(id));
        rt.flush().unwrap();
        assert_eq!(text(&rt, id), "11");

        // A render with no update keeps the stored value.
        rt.schedule(id).unwrap();
        rt.flush().unwrap();
        assert_eq!(text(&rt, id), "11");
        assert_eq!(rt.hook_count(id).unwrap(), 1);
    }

    #[test]
    fn test_updates_are_batched_into_one_render() {
        let setter: Shared<Option<StateSetter<i32>>> = Rc::default();
        let rt = Runtime::new();
        let id = rt.mount(counter(setter.clone())).unwrap();

        let set = setter.borrow().clone().unwrap();
        set.set(1);
        set.set(2);
        set.update(|v| *v += 1);
        assert_eq!(set.get(), 3);

        let report = rt.flush().unwrap();
        assert_eq!(report.passes, 1);
        assert_eq!(report.render_count(), 1);
        assert_eq!(text(&rt, id), "3");
        assert_eq!(rt.stats(id).unwrap().renders, 2);
    }

    #[test]
    fn test_flush_without_updates_renders_nothing() {
        let rt = Runtime::new();
        let log: Shared<Vec<&'static str>> = Rc::default();
        rt.mount(recorder("only", log.clone())).unwrap();
        let report = rt.flush().unwrap();
        assert_eq!(report.passes, 0);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(rt.flush_count(), 1);
    }

    #[test]
    fn test_render_order_parents_first_siblings_in_mount_order() {
        let log: Shared<Vec<&'static str>> = Rc::default();
        let rt = Runtime::new();
        let parent = rt.mount(recorder("parent", log.clone())).unwrap();
        let a = rt.mount_child(parent, recorder("a", log.clone())).unwrap();
        let b = rt.mount_child(parent, recorder("b", log.clone())).unwrap();
        let leaf = rt.mount_child(a, recorder("leaf", log.clone())).unwrap();
        log.borrow_mut().clear();

        for id in [leaf, b, a, parent] {
            rt.schedule(id).unwrap();
        }
        let report = rt.flush().unwrap();

        assert_eq!(*log.borrow(), vec!["parent", "a", "b", "leaf"]);
        assert_eq!(report.rendered, vec![parent, a, b, leaf]);
        assert_eq!(rt.children(parent).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_ref_identity_is_stable_and_writes_do_not_schedule() {
        let seen: Shared<Vec<Ref<u32>>> = Rc::default();
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Holder", Properties::new(), {
                let seen = seen.clone();
                move |_| {
                    let r = use_ref(0u32);
                    seen.borrow_mut().push(r);
                    Ok(Node::Empty)
                }
            }))
            .unwrap();
        rt.schedule(id).unwrap();
        rt.flush().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].ptr_eq(&seen[1]));

        seen[0].set_current(7);
        assert!(!rt.is_dirty(id));
        assert_eq!(seen[1].current(), 7);
    }

    #[test]
    fn test_context_change_rerenders_only_dependents() {
        let ctx = create_context(1i64);
        let rt = Runtime::new();
        let reader = rt
            .mount(Component::from_fn("Reader", Properties::new(), {
                let ctx = ctx.clone();
                move |_| Ok(Node::text(use_context(&ctx).to_string()))
            }))
            .unwrap();
        let bystander = rt
            .mount(Component::from_fn("Bystander", Properties::new(), |_| {
                Ok(Node::Empty)
            }))
            .unwrap();
        assert_eq!(ctx.dependent_count(), 1);

        ctx.set(2);
        assert!(rt.is_dirty(reader));
        assert!(!rt.is_dirty(bystander));

        let report = rt.flush().unwrap();
        assert_eq!(report.rendered, vec![reader]);
        assert_eq!(text(&rt, reader), "2");

        rt.unmount(reader).unwrap();
        assert_eq!(ctx.dependent_count(), 0);
        assert_eq!(ctx.invalidate(), 0);
    }

    #[test]
    fn test_context_dependency_follows_latest_render() {
        let ctx = create_context("a".to_string());
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn(
                "Maybe",
                Properties::new().with("subscribed", true),
                {
                    let ctx = ctx.clone();
                    move |props| {
                        if props.get_bool("subscribed") == Some(true) {
                            return Ok(Node::text(use_context(&ctx)));
                        }
                        Ok(Node::Empty)
                    }
                },
            ))
            .unwrap();
        assert_eq!(ctx.dependent_count(), 1);

        rt.update_properties(id, |p| p.set("subscribed", false))
            .unwrap();
        rt.flush().unwrap();
        assert_eq!(ctx.dependent_count(), 0);

        ctx.set("b".to_string());
        assert!(!rt.has_pending());
    }

    #[test]
    fn test_context_subscribe_and_unsubscribe() {
        let ctx = create_context(0);
        let seen: Shared<Vec<i32>> = Rc::default();
        let sub = ctx.subscribe({
            let seen = seen.clone();
            move |v| seen.borrow_mut().push(*v)
        });

        ctx.set(1);
        assert!(ctx.unsubscribe(sub));
        ctx.set(2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(!ctx.unsubscribe(sub));
        assert_eq!(ctx.subscriber_count(), 0);
        assert_eq!(ctx.value(), 2);
    }

    #[test]
    fn test_use_context_outside_render_reads_value() {
        let ctx = create_context(3u8);
        assert_eq!(use_context(&ctx), 3);
        assert_eq!(ctx.dependent_count(), 0);
    }

    #[test]
    fn test_effect_runs_after_render_and_cleans_up() {
        let log: Shared<Vec<String>> = Rc::default();
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Effectful", Properties::new().with("dep", 1), {
                let log = log.clone();
                move |props| {
                    let dep = props.get_int("dep").unwrap_or(0);
                    log.borrow_mut().push(format!("render {dep}"));
                    let log = log.clone();
                    use_effect(dep, move || {
                        log.borrow_mut().push(format!("run {dep}"));
                        on_unmount(move || log.borrow_mut().push(format!("cleanup {dep}")))
                    });
                    Ok(Node::Empty)
                }
            }))
            .unwrap();
        assert_eq!(*log.borrow(), vec!["render 1", "run 1"]);

        rt.schedule(id).unwrap();
        rt.flush().unwrap();
        assert_eq!(log.borrow().len(), 3);

        rt.update_properties(id, |p| p.set("dep", 2)).unwrap();
        rt.flush().unwrap();
        rt.unmount(id).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "render 1",
                "run 1",
                "render 1",
                "render 2",
                "cleanup 1",
                "run 2",
                "cleanup 2",
            ]
        );
    }

    #[test]
    fn test_runaway_updates_hit_render_loop() {
        let rt = Runtime::with_config(EngineConfig {
            max_render_passes: 8,
            ..EngineConfig::default()
        });
        let id = rt
            .mount(Component::from_fn("Runaway", Properties::new(), |_| {
                let (n, set) = use_state(0u32);
                use_effect(n, move || {
                    set.set(n + 1);
                    Dispose::none()
                });
                Ok(Node::Empty)
            }))
            .unwrap();

        match rt.flush() {
            Err(EngineError::RenderLoop { passes }) => assert_eq!(passes, 8),
            other => panic!("expected RenderLoop, got {other:?}"),
        }
        assert!(rt.is_dirty(id));
    }

    fn flaky() -> Component {
        Component::from_fn("Flaky", Properties::new(), |props| {
            let _ = use_state(0);
            if props.get_bool("extra").unwrap_or(false) {
                let _ = use_ref("extra");
            }
            Ok(Node::Empty)
        })
    }

    #[test]
    fn test_strict_mode_reports_hook_count_change() {
        let rt = Runtime::with_config(EngineConfig::strict());
        let id = rt.mount(flaky()).unwrap();
        rt.update_properties(id, |p| p.set("extra", true)).unwrap();

        match rt.flush() {
            Err(EngineError::HookOrder { component, detail }) => {
                assert_eq!(component, "Flaky");
                assert!(detail.contains("rendered 2 hooks"));
            }
            other => panic!("expected HookOrder, got {other:?}"),
        }
        assert!(rt.instances()[0].flags.contains(InstanceFlags::FAILED));
    }

    #[test]
    fn test_lenient_mode_tolerates_hook_count_change() {
        let rt = Runtime::new();
        let id = rt.mount(flaky()).unwrap();
        rt.update_properties(id, |p| p.set("extra", true)).unwrap();
        rt.flush().unwrap();
        assert_eq!(rt.hook_count(id).unwrap(), 2);
    }

    #[test]
    fn test_strict_mode_reports_slot_type_change() {
        let rt = Runtime::with_config(EngineConfig::strict());
        let id = rt
            .mount(Component::from_fn("Shifty", Properties::new(), |props| {
                if props.get_bool("as_ref").unwrap_or(false) {
                    let _ = use_ref(0i32);
                } else {
                    let _ = use_state(0i32);
                }
                Ok(Node::Empty)
            }))
            .unwrap();
        rt.update_properties(id, |p| p.set("as_ref", true)).unwrap();

        let err = rt.flush().unwrap_err();
        assert!(err.to_string().contains("use_ref at slot 0"));
    }

    #[test]
    fn test_mounting_base_component_fails_not_implemented() {
        let rt = Runtime::new();
        let err = rt.mount(Component::new(Properties::new())).unwrap_err();
        assert!(err.is_not_implemented());
        assert!(rt.is_empty());
    }

    #[test]
    fn test_unmount_cascades_to_children() {
        let cleaned: Shared<Vec<&'static str>> = Rc::default();
        let with_cleanup = |name: &'static str| {
            let cleaned = cleaned.clone();
            Component::from_fn(name, Properties::new(), move |_| {
                let cleaned = cleaned.clone();
                use_effect((), move || on_unmount(move || cleaned.borrow_mut().push(name)));
                Ok(Node::Empty)
            })
        };

        let rt = Runtime::new();
        let parent = rt.mount(with_cleanup("parent")).unwrap();
        let child = rt.mount_child(parent, with_cleanup("child")).unwrap();
        assert_eq!(rt.len(), 2);

        rt.unmount(parent).unwrap();
        assert!(rt.is_empty());
        assert_eq!(*cleaned.borrow(), vec!["child", "parent"]);

        assert!(matches!(rt.unmount(child), Err(EngineError::NotMounted(_))));
        assert!(matches!(rt.output(parent), Err(EngineError::NotMounted(_))));
        assert!(matches!(
            rt.mount_child(parent, with_cleanup("orphan")),
            Err(EngineError::NotMounted(_))
        ));
    }

    #[test]
    fn test_dropping_runtime_runs_cleanups() {
        let cleaned = Rc::new(Cell::new(false));
        {
            let rt = Runtime::new();
            let cleaned = cleaned.clone();
            rt.mount(Component::from_fn("Leaky", Properties::new(), move |_| {
                let cleaned = cleaned.clone();
                use_effect((), move || on_unmount(move || cleaned.set(true)));
                Ok(Node::Empty)
            }))
            .unwrap();
        }
        assert!(cleaned.get());
    }

    #[derive(Debug)]
    enum Action {
        Add(i64),
        Reset,
    }

    #[test]
    fn test_reducer_accumulates_dispatches() {
        let dispatch: Shared<Option<Dispatch<Action>>> = Rc::default();
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Total", Properties::new(), {
                let dispatch = dispatch.clone();
                move |_| {
                    let (total, d) = use_reducer(
                        |s: &i64, a: Action| match a {
                            Action::Add(n) => s + n,
                            Action::Reset => 0,
                        },
                        0,
                    );
                    *dispatch.borrow_mut() = Some(d);
                    Ok(Node::text(total.to_string()))
                }
            }))
            .unwrap();

        let d = dispatch.borrow().clone().unwrap();
        d.dispatch(Action::Add(2));
        d.dispatch(Action::Add(3));
        assert_eq!(rt.flush().unwrap().render_count(), 1);
        assert_eq!(text(&rt, id), "5");

        d.dispatch(Action::Reset);
        rt.flush().unwrap();
        assert_eq!(text(&rt, id), "0");
    }

    #[test]
    fn test_reducer_init_runs_once() {
        let inits = Rc::new(Cell::new(0));
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Lazy", Properties::new(), {
                let inits = inits.clone();
                move |_| {
                    let inits = inits.clone();
                    let (v, _) = use_reducer_with_init(
                        |s: &String, suffix: &'static str| format!("{s}{suffix}"),
                        3usize,
                        move |n| {
                            inits.set(inits.get() + 1);
                            "x".repeat(n)
                        },
                    );
                    Ok(Node::text(v))
                }
            }))
            .unwrap();
        rt.schedule(id).unwrap();
        rt.flush().unwrap();
        assert_eq!(inits.get(), 1);
        assert_eq!(text(&rt, id), "xxx");
    }

    struct Toggle;

    impl Reducible for Toggle {
        type State = bool;
        type Action = ();

        fn initial_state() -> bool {
            false
        }

        fn reduce(state: &bool, _: ()) -> bool {
            !state
        }
    }

    #[test]
    fn test_reducible_component() {
        let dispatch: Shared<Option<Dispatch<()>>> = Rc::default();
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Switch", Properties::new(), {
                let dispatch = dispatch.clone();
                move |_| {
                    let (on, d) = use_reducible::<Toggle>();
                    *dispatch.borrow_mut() = Some(d);
                    Ok(Node::text(if on { "on" } else { "off" }))
                }
            }))
            .unwrap();
        dispatch.borrow().clone().unwrap().dispatch(());
        rt.flush().unwrap();
        assert_eq!(text(&rt, id), "on");
    }

    #[test]
    fn test_handles_outliving_runtime_are_inert() {
        let setter: Shared<Option<StateSetter<i32>>> = Rc::default();
        {
            let rt = Runtime::new();
            rt.mount(counter(setter.clone())).unwrap();
        }
        let set = setter.borrow().clone().unwrap();
        set.set(99);
        assert_eq!(set.get(), 99);
    }

    #[test]
    fn test_detached_hooks_do_not_persist() {
        assert!(!is_rendering());

        let (value, set) = use_state(0);
        assert_eq!(value, 0);
        assert!(set.is_detached());
        set.set(5);
        assert_eq!(set.get(), 5);
        let (again, _) = use_state(0);
        assert_eq!(again, 0);

        let (total, dispatch) = use_reducer(|s: &i32, a: i32| s + a, 1);
        dispatch.dispatch(4);
        let (fresh, _) = use_reducer(|s: &i32, a: i32| s + a, 1);
        assert_eq!((total, fresh), (1, 1));

        let a = use_ref(1);
        let b = use_ref(1);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_memo_recomputes_on_dep_change_only() {
        let computed = Rc::new(Cell::new(0));
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Memo", Properties::new().with("n", 2), {
                let computed = computed.clone();
                move |props| {
                    let n = props.get_int("n").unwrap_or(0);
                    let squared = use_memo(n, |n| {
                        computed.set(computed.get() + 1);
                        n * n
                    });
                    Ok(Node::text(squared.to_string()))
                }
            }))
            .unwrap();
        rt.schedule(id).unwrap();
        rt.flush().unwrap();
        assert_eq!(computed.get(), 1);

        rt.update_properties(id, |p| p.set("n", 3)).unwrap();
        rt.flush().unwrap();
        assert_eq!(computed.get(), 2);
        assert_eq!(text(&rt, id), "9");
    }

    #[test]
    fn test_render_error_keeps_previous_output() {
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Fragile", Properties::new(), |props| {
                if props.get_bool("fail").unwrap_or(false) {
                    return Err(EngineError::render("Fragile", "boom"));
                }
                Ok(Node::text("ok"))
            }))
            .unwrap();

        rt.update_properties(id, |p| p.set("fail", true)).unwrap();
        assert!(matches!(rt.flush(), Err(EngineError::Render { .. })));
        assert_eq!(text(&rt, id), "ok");
        assert_eq!(rt.stats(id).unwrap().failures, 1);

        rt.update_properties(id, |p| {
            p.remove("fail");
        })
        .unwrap();
        rt.flush().unwrap();
        assert!(!rt.instances()[0].flags.contains(InstanceFlags::FAILED));
    }

    #[test]
    fn test_effect_reruns_after_failed_render() {
        let runs: Shared<Vec<i64>> = Rc::default();
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Watcher", Properties::new().with("dep", 0), {
                let runs = runs.clone();
                move |props| {
                    let dep = props.get_int("dep").unwrap_or(0);
                    let runs = runs.clone();
                    use_effect(dep, move || {
                        runs.borrow_mut().push(dep);
                        Dispose::none()
                    });
                    if props.get_bool("fail").unwrap_or(false) {
                        return Err(EngineError::render("Watcher", "boom"));
                    }
                    Ok(Node::Empty)
                }
            }))
            .unwrap();
        assert_eq!(*runs.borrow(), vec![0]);

        rt.update_properties(id, |p| {
            p.set("dep", 1);
            p.set("fail", true);
        })
        .unwrap();
        assert!(rt.flush().is_err());
        assert_eq!(*runs.borrow(), vec![0]);

        rt.update_properties(id, |p| {
            p.remove("fail");
        })
        .unwrap();
        rt.flush().unwrap();
        assert_eq!(*runs.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_strict_violation_discards_effects_until_next_good_render() {
        let runs = Rc::new(Cell::new(0));
        let rt = Runtime::with_config(EngineConfig::strict());
        let id = rt
            .mount(Component::from_fn("Growing", Properties::new(), {
                let runs = runs.clone();
                move |props| {
                    let extra = props.get_bool("extra").unwrap_or(false);
                    let runs = runs.clone();
                    use_effect(extra, move || {
                        runs.set(runs.get() + 1);
                        Dispose::none()
                    });
                    if extra {
                        let _ = use_ref(0u8);
                    }
                    Ok(Node::Empty)
                }
            }))
            .unwrap();
        rt.update_properties(id, |p| p.set("extra", true)).unwrap();
        assert!(matches!(rt.flush(), Err(EngineError::HookOrder { .. })));
        assert_eq!(runs.get(), 1);

        // Same hook count as the last render now, so the deferred effect runs.
        rt.schedule(id).unwrap();
        rt.flush().unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_shrinking_hook_list_drops_stale_slots() {
        let cleaned = Rc::new(Cell::new(0));
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Shrinking", Properties::new().with("wide", true), {
                let cleaned = cleaned.clone();
                move |props| {
                    let (a, _) = use_state(1);
                    if props.get_bool("wide").unwrap_or(false) {
                        let _ = use_state(2);
                        let _ = use_state(3);
                        let cleaned = cleaned.clone();
                        use_effect((), move || on_unmount(move || cleaned.set(cleaned.get() + 1)));
                    }
                    Ok(Node::text(a.to_string()))
                }
            }))
            .unwrap();
        assert_eq!(rt.hook_count(id).unwrap(), 4);

        rt.update_properties(id, |p| p.set("wide", false)).unwrap();
        rt.flush().unwrap();
        assert_eq!(rt.hook_count(id).unwrap(), 1);
        assert_eq!(rt.instances()[0].hook_slots, 1);
        assert_eq!(cleaned.get(), 1);
        assert_eq!(text(&rt, id), "1");

        rt.unmount(id).unwrap();
        assert_eq!(cleaned.get(), 1);
    }

    #[test]
    fn test_replaced_effect_slot_cleans_up_at_once() {
        let cleaned = Rc::new(Cell::new(false));
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Swapping", Properties::new(), {
                let cleaned = cleaned.clone();
                move |props| {
                    if props.get_bool("swap").unwrap_or(false) {
                        let _ = use_state(0i32);
                    } else {
                        let cleaned = cleaned.clone();
                        use_effect((), move || on_unmount(move || cleaned.set(true)));
                    }
                    Ok(Node::Empty)
                }
            }))
            .unwrap();
        assert!(!cleaned.get());

        rt.update_properties(id, |p| p.set("swap", true)).unwrap();
        rt.flush().unwrap();
        assert!(cleaned.get());
        assert!(rt.contains(id));
    }

    #[test]
    fn test_mount_child_under_unknown_parent_fails() {
        let rt = Runtime::new();
        let gone = rt.mount(recorder("Gone", Rc::default())).unwrap();
        rt.unmount(gone).unwrap();

        match rt.mount_child(gone, recorder("Orphan", Rc::default())) {
            Err(EngineError::NotMounted(id)) => assert_eq!(id, gone),
            other => panic!("expected NotMounted, got {other:?}"),
        }
        assert!(rt.is_empty());
    }

    #[test]
    fn test_failed_first_render_rolls_back_mount() {
        let cleaned = Rc::new(Cell::new(false));
        let rt = Runtime::new();
        let root = rt.mount(recorder("Root", Rc::default())).unwrap();

        let err = rt
            .mount_child(root, Component::from_fn("Broken", Properties::new(), {
                let cleaned = cleaned.clone();
                move |_| {
                    let (_, set) = use_state(0);
                    set.set(1);
                    let cleaned = cleaned.clone();
                    use_effect((), move || on_unmount(move || cleaned.set(true)));
                    Err(EngineError::render("Broken", "no data"))
                }
            }))
            .unwrap_err();

        assert!(matches!(err, EngineError::Render { ref component, .. } if component == "Broken"));
        assert_eq!(rt.len(), 1);
        assert!(rt.children(root).unwrap().is_empty());
        assert!(!rt.has_pending());
        assert!(!cleaned.get());
    }

    #[test]
    fn test_setter_and_dispatch_may_call_back_into_themselves() {
        let rt = Runtime::new();
        let setter: Shared<Option<StateSetter<i32>>> = Rc::default();
        let id = rt.mount(counter(setter.clone())).unwrap();

        let set = setter.borrow().clone().unwrap();
        let again = set.clone();
        set.update(|v| *v += again.get());
        rt.flush().unwrap();
        assert_eq!(text(&rt, id), "20");

        let outbox: Shared<Option<Dispatch<bool>>> = Rc::default();
        let id = rt
            .mount(Component::from_fn("Echo", Properties::new(), {
                let outbox = outbox.clone();
                move |_| {
                    let inner = outbox.clone();
                    let (n, dispatch) = use_reducer(
                        move |n: &i32, nested: bool| {
                            if nested {
                                if let Some(d) = inner.borrow().clone() {
                                    d.dispatch(false);
                                }
                                n + 10
                            } else {
                                n + 1
                            }
                        },
                        0,
                    );
                    *outbox.borrow_mut() = Some(dispatch);
                    Ok(Node::text(n.to_string()))
                }
            }))
            .unwrap();

        let dispatch = outbox.borrow().clone().unwrap();
        dispatch.dispatch(true);
        rt.flush().unwrap();
        assert_eq!(text(&rt, id), "10");
    }

    #[test]
    fn test_current_instance_is_set_during_render() {
        let seen: Shared<Option<InstanceId>> = Rc::default();
        let rt = Runtime::new();
        let id = rt
            .mount(Component::from_fn("Self", Properties::new(), {
                let seen = seen.clone();
                move |_| {
                    *seen.borrow_mut() = current_instance();
                    Ok(Node::Empty)
                }
            }))
            .unwrap();
        assert_eq!(*seen.borrow(), Some(id));
        assert_eq!(current_instance(), None);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let cleaned_up = Rc::new(Cell::new(0));

        let scope = Scope::new();
        let c = cleaned_up.clone();
        scope.add_disposer(move || c.set(c.get() + 1));
        let c = cleaned_up.clone();
        scope.run(|| scoped_effect(move || -> Box<dyn FnOnce()> { Box::new(move || c.set(c.get() + 1)) }));
        assert_eq!(scope.pending(), 2);

        scope.dispose();
        scope.dispose();
        assert_eq!(cleaned_up.get(), 2);
        assert!(current_scope().is_none());
    }
}
