use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::scope::Scope;
use crate::{Component, EngineConfig, EngineError, Node, Properties, Result, reactive};

new_key_type! {
    /// Handle to a mounted component instance.
    pub struct InstanceId;
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct InstanceFlags: u8 {
        const MOUNTED = 1 << 0;
        const RENDERING = 1 << 1;
        /// The last render returned an error.
        const FAILED = 1 << 2;
    }
}

thread_local! {
    static CURRENT_FRAME: RefCell<Option<RenderFrame>> = const { RefCell::new(None) };
}

/// Instances waiting for a re-render. Shared (weakly) with every setter,
/// dispatcher and context edge pointing into one runtime.
#[derive(Default)]
pub(crate) struct UpdateQueue {
    dirty: HashSet<InstanceId>,
}

/// Where an update lands: one instance of one runtime.
#[derive(Clone)]
pub(crate) struct UpdateTarget {
    queue: Weak<RefCell<UpdateQueue>>,
    instance: InstanceId,
}

impl UpdateTarget {
    /// Marks the instance dirty. Returns false when the runtime is gone.
    pub(crate) fn schedule(&self) -> bool {
        match self.queue.upgrade() {
            Some(q) => {
                if q.borrow_mut().dirty.insert(self.instance) {
                    log::trace!("scheduled re-render of {:?}", self.instance);
                }
                true
            }
            None => {
                log::trace!("update for {:?} dropped: runtime is gone", self.instance);
                false
            }
        }
    }

    pub(crate) fn instance(&self) -> InstanceId {
        self.instance
    }
}

impl PartialEq for UpdateTarget {
    fn eq(&self, other: &Self) -> bool {
        self.instance == other.instance && Weak::ptr_eq(&self.queue, &other.queue)
    }
}

impl Eq for UpdateTarget {}

impl Hash for UpdateTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.queue.as_ptr() as *const () as usize).hash(state);
        self.instance.hash(state);
    }
}

pub(crate) type PendingEffect = Box<dyn FnOnce()>;

/// Hook state of the instance currently rendering on this thread.
struct RenderFrame {
    target: UpdateTarget,
    component: String,
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    effects: SmallVec<[PendingEffect; 2]>,
    violations: Vec<String>,
}

/// Returns the hook slot at the cursor and advances it. The slot is created
/// with `init` when it is new or holds a different type; the bool is true in
/// that case. Outside a render pass `init` is handed back unrun.
pub(crate) fn slot<T, F>(hook: &'static str, init: F) -> std::result::Result<(Rc<T>, bool), F>
where
    T: 'static,
    F: FnOnce() -> T,
{
    enum Lookup<T> {
        Found(Rc<T>),
        Create(usize, Option<Box<dyn Any>>),
    }

    let lookup = CURRENT_FRAME.with(|f| {
        let mut f = f.borrow_mut();
        let frame = f.as_mut()?;
        let idx = frame.cursor;
        frame.cursor += 1;

        match frame.slots.get(idx) {
            Some(existing) => {
                if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                    return Some(Lookup::Found(rc.clone()));
                }
                let detail = format!("{hook} at slot {idx} found a slot of another type");
                log::warn!(
                    "{}: {}; replacing. Hooks must run in the same order on every render.",
                    frame.component,
                    detail
                );
                frame.violations.push(detail);
                let replaced = std::mem::replace(&mut frame.slots[idx], Box::new(()));
                return Some(Lookup::Create(idx, Some(replaced)));
            }
            None => frame.slots.push(Box::new(())),
        }
        Some(Lookup::Create(idx, None))
    });

    match lookup {
        None => Err(init),
        Some(Lookup::Found(rc)) => Ok((rc, false)),
        Some(Lookup::Create(idx, replaced)) => {
            // Dropping a slot may run an effect cleanup, which must not see
            // the frame borrowed.
            drop(replaced);
            // init runs without the frame borrowed so it may read contexts.
            let rc = Rc::new(init());
            CURRENT_FRAME.with(|f| {
                if let Some(frame) = f.borrow_mut().as_mut()
                    && let Some(s) = frame.slots.get_mut(idx)
                {
                    *s = Box::new(rc.clone());
                }
            });
            Ok((rc, true))
        }
    }
}

pub(crate) fn current_target() -> Option<UpdateTarget> {
    CURRENT_FRAME.with(|f| f.borrow().as_ref().map(|frame| frame.target.clone()))
}

/// Queues `effect` to run once the current render completes. Returns the
/// effect back when no render is in progress.
pub(crate) fn queue_effect(effect: PendingEffect) -> std::result::Result<(), PendingEffect> {
    CURRENT_FRAME.with(|f| match f.borrow_mut().as_mut() {
        Some(frame) => {
            frame.effects.push(effect);
            Ok(())
        }
        None => Err(effect),
    })
}

pub fn is_rendering() -> bool {
    CURRENT_FRAME.with(|f| f.borrow().is_some())
}

pub fn current_instance() -> Option<InstanceId> {
    current_target().map(|t| t.instance())
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub renders: u64,
    pub failures: u64,
    pub last_duration: Option<Duration>,
    pub total_duration: Duration,
}

/// Snapshot of one instance, for inspection.
#[derive(Clone, Debug)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub name: String,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
    pub depth: usize,
    pub hook_slots: usize,
    pub dirty: bool,
    pub flags: InstanceFlags,
    pub stats: RenderStats,
}

#[derive(Clone, Debug, Default)]
pub struct FlushReport {
    pub passes: usize,
    /// Instances in the order they were rendered.
    pub rendered: Vec<InstanceId>,
}

impl FlushReport {
    pub fn render_count(&self) -> usize {
        self.rendered.len()
    }
}

struct Instance {
    // None while the instance is rendering.
    component: Option<Component>,
    name: String,
    slots: Vec<Box<dyn Any>>,
    hook_count: Option<usize>,
    flags: InstanceFlags,
    depth: usize,
    seq: u64,
    parent: Option<InstanceId>,
    children: SmallVec<[InstanceId; 4]>,
    scope: Scope,
    output: Option<Node>,
    stats: RenderStats,
}

#[derive(Default)]
struct RuntimeInner {
    instances: SlotMap<InstanceId, Instance>,
    next_seq: u64,
    flushes: u64,
}

/// Owns mounted component instances and their hook state, and renders the
/// ones that were updated.
///
/// ```rust
/// use component_engine::*;
///
/// let rt = Runtime::new();
/// let id = rt
///     .mount(Component::from_fn("Counter", Properties::new(), |_| {
///         let (count, set_count) = use_state(0);
///         if count == 0 {
///             set_count.set(1);
///         }
///         Ok(Node::text(count.to_string()))
///     }))
///     .unwrap();
///
/// assert_eq!(rt.output(id).unwrap(), Some(Node::text("0")));
/// rt.flush().unwrap();
/// assert_eq!(rt.output(id).unwrap(), Some(Node::text("1")));
/// ```
pub struct Runtime {
    config: EngineConfig,
    inner: RefCell<RuntimeInner>,
    queue: Rc<RefCell<UpdateQueue>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            inner: RefCell::new(RuntimeInner::default()),
            queue: Rc::new(RefCell::new(UpdateQueue::default())),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mounts a root component and renders it once. If that first render
    /// fails the instance is unmounted again and the error returned.
    pub fn mount(&self, component: Component) -> Result<InstanceId> {
        self.insert(None, component)
    }

    /// Mounts `component` below `parent`. Children render after their
    /// parent within a flush and are unmounted with it.
    pub fn mount_child(&self, parent: InstanceId, component: Component) -> Result<InstanceId> {
        self.insert(Some(parent), component)
    }

    fn insert(&self, parent: Option<InstanceId>, component: Component) -> Result<InstanceId> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let depth = match parent {
                Some(p) => inner.instances.get(p).ok_or(EngineError::NotMounted(p))?.depth + 1,
                None => 0,
            };
            let seq = inner.next_seq;
            inner.next_seq += 1;
            let name = component.name().to_string();
            let id = inner.instances.insert(Instance {
                component: Some(component),
                name,
                slots: Vec::new(),
                hook_count: None,
                flags: InstanceFlags::MOUNTED,
                depth,
                seq,
                parent,
                children: SmallVec::new(),
                scope: Scope::new(),
                output: None,
                stats: RenderStats::default(),
            });
            if let Some(p) = parent
                && let Some(pi) = inner.instances.get_mut(p)
            {
                pi.children.push(id);
            }
            log::debug!("mounted {} as {:?} (depth {})", inner.instances[id].name, id, depth);
            id
        };

        if let Err(e) = self.render_instance(id) {
            log::debug!("first render of {:?} failed, rolling back mount: {}", id, e);
            self.unmount(id)?;
            return Err(e);
        }
        Ok(id)
    }

    /// Unmounts `id` and its descendants, children first. Effect cleanups
    /// registered by those instances run here.
    pub fn unmount(&self, id: InstanceId) -> Result<()> {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let parent = inner.instances.get(id).ok_or(EngineError::NotMounted(id))?.parent;
            if let Some(p) = parent
                && let Some(pi) = inner.instances.get_mut(p)
            {
                pi.children.retain(|c| *c != id);
            }
            let mut order = Vec::new();
            collect_post_order(&inner.instances, id, &mut order);
            order
                .into_iter()
                .filter_map(|i| inner.instances.remove(i).map(|inst| (i, inst)))
                .collect::<Vec<_>>()
        };

        {
            let mut q = self.queue.borrow_mut();
            for (i, _) in &removed {
                q.dirty.remove(i);
            }
        }

        for (i, inst) in removed {
            reactive::clear_dependencies(&self.target(i));
            inst.scope.dispose();
            log::debug!("unmounted {} ({:?})", inst.name, i);
        }
        Ok(())
    }

    /// Marks `id` for re-render on the next `flush`.
    pub fn schedule(&self, id: InstanceId) -> Result<()> {
        if !self.inner.borrow().instances.contains_key(id) {
            return Err(EngineError::NotMounted(id));
        }
        self.target(id).schedule();
        Ok(())
    }

    pub fn is_dirty(&self, id: InstanceId) -> bool {
        self.inner.borrow().instances.contains_key(id) && self.queue.borrow().dirty.contains(&id)
    }

    pub fn has_pending(&self) -> bool {
        let inner = self.inner.borrow();
        self.queue
            .borrow()
            .dirty
            .iter()
            .any(|id| inner.instances.contains_key(*id))
    }

    /// Renders dirty instances until none are left. Within a pass instances
    /// render parents first, siblings in mount order, each at most once;
    /// updates raised during a pass are picked up by the next one.
    pub fn flush(&self) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        loop {
            let pending = std::mem::take(&mut self.queue.borrow_mut().dirty);
            let mut batch: Vec<(usize, u64, InstanceId)> = {
                let inner = self.inner.borrow();
                pending
                    .into_iter()
                    .filter_map(|id| inner.instances.get(id).map(|i| (i.depth, i.seq, id)))
                    .collect()
            };
            if batch.is_empty() {
                break;
            }
            if report.passes >= self.config.max_render_passes {
                self.queue.borrow_mut().dirty.extend(batch.iter().map(|b| b.2));
                log::warn!(
                    "flush gave up after {} passes with {} instances still dirty",
                    report.passes,
                    batch.len()
                );
                return Err(EngineError::RenderLoop {
                    passes: report.passes,
                });
            }
            batch.sort_by_key(|&(depth, seq, _)| (depth, seq));
            report.passes += 1;
            log::trace!("render pass {} over {} instances", report.passes, batch.len());

            for (pos, &(_, _, id)) in batch.iter().enumerate() {
                if !self.inner.borrow().instances.contains_key(id) {
                    continue;
                }
                if let Err(e) = self.render_instance(id) {
                    self.queue
                        .borrow_mut()
                        .dirty
                        .extend(batch[pos + 1..].iter().map(|b| b.2));
                    return Err(e);
                }
                report.rendered.push(id);
            }
        }
        self.inner.borrow_mut().flushes += 1;
        Ok(report)
    }

    fn render_instance(&self, id: InstanceId) -> Result<()> {
        let (component, slots, scope, name) = {
            let mut inner = self.inner.borrow_mut();
            let inst = inner.instances.get_mut(id).ok_or(EngineError::NotMounted(id))?;
            if inst.flags.contains(InstanceFlags::RENDERING) {
                log::warn!("{}: re-entrant render skipped, kept dirty", inst.name);
                self.target(id).schedule();
                return Ok(());
            }
            let component = inst.component.take().ok_or(EngineError::NotMounted(id))?;
            inst.flags.insert(InstanceFlags::RENDERING);
            (
                component,
                std::mem::take(&mut inst.slots),
                inst.scope.clone(),
                inst.name.clone(),
            )
        };

        let target = self.target(id);
        reactive::clear_dependencies(&target);
        let frame = RenderFrame {
            target,
            component: name.clone(),
            slots,
            cursor: 0,
            effects: SmallVec::new(),
            violations: Vec::new(),
        };

        let prev = CURRENT_FRAME.with(|f| f.replace(Some(frame)));
        let started = self.config.track_render_time.then(Instant::now);
        let result = scope.run(|| component.render());
        let elapsed = started.map(|s| s.elapsed());
        let frame = CURRENT_FRAME.with(|f| f.replace(prev));

        let (mut slots, cursor, effects, mut violations) = match frame {
            Some(f) => (f.slots, f.cursor, f.effects, f.violations),
            None => (Vec::new(), 0, SmallVec::new(), Vec::new()),
        };
        // Slots past the cursor belong to hooks this render no longer calls.
        let stale = if result.is_ok() && cursor < slots.len() {
            slots.split_off(cursor)
        } else {
            Vec::new()
        };

        let outcome = 'store: {
            let mut inner = self.inner.borrow_mut();
            let Some(inst) = inner.instances.get_mut(id) else {
                break 'store Ok(());
            };
            inst.component = Some(component);
            inst.slots = slots;
            inst.flags.remove(InstanceFlags::RENDERING);
            if let Some(d) = elapsed {
                inst.stats.last_duration = Some(d);
                inst.stats.total_duration += d;
            }

            let node = match result {
                Ok(node) => node,
                Err(e) => {
                    inst.flags.insert(InstanceFlags::FAILED);
                    inst.stats.failures += 1;
                    log::debug!("render of {} failed: {}", name, e);
                    break 'store Err(e);
                }
            };

            if let Some(prev_count) = inst.hook_count
                && prev_count != cursor
            {
                let detail = format!("rendered {cursor} hooks, previous render used {prev_count}");
                log::warn!("{}: {}", name, detail);
                violations.push(detail);
            }
            inst.hook_count = Some(cursor);
            inst.stats.renders += 1;

            if self.config.strict_hooks && !violations.is_empty() {
                inst.flags.insert(InstanceFlags::FAILED);
                inst.stats.failures += 1;
                break 'store Err(EngineError::HookOrder {
                    component: name.clone(),
                    detail: violations.join("; "),
                });
            }
            inst.flags.remove(InstanceFlags::FAILED);
            inst.output = Some(node);
            Ok(())
        };

        // Dropped slots may run effect cleanups; the runtime is not borrowed
        // here.
        if !stale.is_empty() {
            log::debug!("{}: dropping {} unused hook slots", name, stale.len());
            scope.run(|| drop(stale));
        }
        // Effects queued by a failed render are dropped unrun.
        outcome?;

        if !effects.is_empty() {
            scope.run(|| {
                for effect in effects {
                    effect();
                }
            });
        }
        Ok(())
    }

    fn target(&self, id: InstanceId) -> UpdateTarget {
        UpdateTarget {
            queue: Rc::downgrade(&self.queue),
            instance: id,
        }
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.inner.borrow().instances.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of completed `flush` calls.
    pub fn flush_count(&self) -> u64 {
        self.inner.borrow().flushes
    }

    /// Latest successful render output.
    pub fn output(&self, id: InstanceId) -> Result<Option<Node>> {
        let inner = self.inner.borrow();
        let inst = inner.instances.get(id).ok_or(EngineError::NotMounted(id))?;
        Ok(inst.output.clone())
    }

    pub fn properties(&self, id: InstanceId) -> Result<Properties> {
        let inner = self.inner.borrow();
        let inst = inner.instances.get(id).ok_or(EngineError::NotMounted(id))?;
        Ok(inst
            .component
            .as_ref()
            .map(|c| c.properties().clone())
            .unwrap_or_default())
    }

    /// Mutates the instance's properties and schedules a re-render.
    pub fn update_properties(&self, id: InstanceId, f: impl FnOnce(&mut Properties)) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let inst = inner.instances.get_mut(id).ok_or(EngineError::NotMounted(id))?;
            let Some(component) = inst.component.as_mut() else {
                return Err(EngineError::render(
                    inst.name.clone(),
                    "properties cannot change while the component renders",
                ));
            };
            f(component.properties_mut());
        }
        self.target(id).schedule();
        Ok(())
    }

    pub fn stats(&self, id: InstanceId) -> Result<RenderStats> {
        let inner = self.inner.borrow();
        let inst = inner.instances.get(id).ok_or(EngineError::NotMounted(id))?;
        Ok(inst.stats.clone())
    }

    /// Hook slots the instance holds after its last successful render.
    pub fn hook_count(&self, id: InstanceId) -> Result<usize> {
        let inner = self.inner.borrow();
        let inst = inner.instances.get(id).ok_or(EngineError::NotMounted(id))?;
        Ok(inst.slots.len())
    }

    pub fn children(&self, id: InstanceId) -> Result<Vec<InstanceId>> {
        let inner = self.inner.borrow();
        let inst = inner.instances.get(id).ok_or(EngineError::NotMounted(id))?;
        Ok(inst.children.to_vec())
    }

    /// All instances, parents before children, siblings in mount order.
    pub fn instances(&self) -> Vec<InstanceInfo> {
        let inner = self.inner.borrow();
        let dirty = self.queue.borrow();
        let mut out: Vec<(usize, u64, InstanceInfo)> = inner
            .instances
            .iter()
            .map(|(id, inst)| {
                (
                    inst.depth,
                    inst.seq,
                    InstanceInfo {
                        id,
                        name: inst.name.clone(),
                        parent: inst.parent,
                        children: inst.children.to_vec(),
                        depth: inst.depth,
                        hook_slots: inst.slots.len(),
                        dirty: dirty.dirty.contains(&id),
                        flags: inst.flags,
                        stats: inst.stats.clone(),
                    },
                )
            })
            .collect();
        out.sort_by_key(|(depth, seq, _)| (*depth, *seq));
        out.into_iter().map(|(_, _, info)| info).collect()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let inner = std::mem::take(self.inner.get_mut());
        let mut remaining: Vec<(usize, u64, InstanceId, Instance)> = inner
            .instances
            .into_iter()
            .map(|(id, inst)| (inst.depth, inst.seq, id, inst))
            .collect();
        // Deepest first so children clean up before their parents.
        remaining.sort_by_key(|(depth, seq, _, _)| (std::cmp::Reverse(*depth), *seq));
        for (_, _, id, inst) in remaining {
            reactive::clear_dependencies(&self.target(id));
            inst.scope.dispose();
        }
    }
}

fn collect_post_order(
    instances: &SlotMap<InstanceId, Instance>,
    id: InstanceId,
    out: &mut Vec<InstanceId>,
) {
    if let Some(inst) = instances.get(id) {
        for child in &inst.children {
            collect_post_order(instances, *child, out);
        }
        out.push(id);
    }
}
