//! Hook registry for managing and executing post-tick hooks.

use std::sync::Arc;

use combat_core::{CombatContext, Env, World};
use combat_core::state::Tick;
use tracing::{debug, error};

use super::{HookContext, HookCriticality, PostTickHook};
use crate::error::{HookError, Result, RuntimeError};

/// Roll stream base for hook contexts, clear of the per-creature streams.
const HOOK_STREAM: u32 = 0x8000_0000;

/// Registry that runs post-tick hooks in priority order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn PostTickHook>>,
}

impl HookRegistry {
    /// Creates a registry; hooks are sorted by priority (lower first).
    pub fn new(mut hooks: Vec<Arc<dyn PostTickHook>>) -> Self {
        hooks.sort_by_key(|h| h.priority());
        Self { hooks }
    }

    /// The hooks every world needs: the death sweep.
    pub fn default_hooks() -> Self {
        Self::new(vec![Arc::new(super::DeathSweepHook) as Arc<dyn PostTickHook>])
    }

    /// Adds a hook, keeping priority order. Equal priorities keep insertion order.
    pub fn register(&mut self, hook: Arc<dyn PostTickHook>) {
        self.hooks.push(hook);
        self.hooks.sort_by_key(|h| h.priority());
    }

    /// Runs every triggered hook.
    ///
    /// # Error Handling
    ///
    /// - `Critical`: returns the error immediately; later hooks do not run
    /// - `Important`: logs at error level and continues
    /// - `Optional`: logs at debug level and continues
    pub fn execute_hooks(
        &self,
        world: &mut World,
        env: Env<'_>,
        now: Tick,
        ctx: &HookContext<'_>,
    ) -> Result<()> {
        for (index, hook) in self.hooks.iter().enumerate() {
            if !hook.should_trigger(world, ctx) {
                continue;
            }
            debug!(target: "runtime::hooks", hook = hook.name(), now, "running hook");
            let mut combat = CombatContext::with_stream(world, env, now, HOOK_STREAM + index as u32)?;
            if let Err(e) = hook.execute(&mut combat, ctx) {
                self.handle_hook_error(hook.as_ref(), e)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names and priorities, in run order.
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.hooks.iter().map(|h| (h.name(), h.priority()))
    }

    fn handle_hook_error(&self, hook: &dyn PostTickHook, error: HookError) -> Result<()> {
        match hook.criticality() {
            HookCriticality::Critical => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "critical",
                    error = %error,
                    "Critical hook failed, aborting tick"
                );
                return Err(RuntimeError::CriticalHook {
                    hook: hook.name(),
                    source: error,
                });
            }
            HookCriticality::Important => error!(
                target: "runtime::hooks",
                hook = hook.name(),
                criticality = "important",
                error = %error,
                "Hook failed, continuing"
            ),
            HookCriticality::Optional => debug!(
                target: "runtime::hooks",
                hook = hook.name(),
                criticality = "optional",
                error = %error,
                "Optional hook failed"
            ),
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.hooks()).finish()
    }
}
