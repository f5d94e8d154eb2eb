use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::compile::error::{CompileError, CompileErrorKind};
use crate::compile::fingerprint::{SourceFingerprint, fingerprint_source};
use crate::program::error::ProgramError;
use crate::program::exec::instantiate;
use crate::program::resolve::ProgramTemplate;
use crate::render::renderer::Renderer;
use crate::synth::builder::SynthesizedSource;

/// Templates kept by [`ProgramCompiler::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Turns synthesized program text into a ready-to-run renderer.
pub trait GraphCompiler: Send + Sync {
    fn compile(&self, source: &SynthesizedSource) -> Result<Arc<dyn Renderer>, CompileError>;
}

/// Counters of the template cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Default)]
struct TemplateCache {
    entries: HashMap<SourceFingerprint, (Arc<str>, Arc<ProgramTemplate>)>,
    order: VecDeque<SourceFingerprint>,
    hits: u64,
    misses: u64,
}

/// [`GraphCompiler`] for the built-in pixel program language.
///
/// Parsed and resolved templates are cached by source fingerprint, so pictures that share a
/// graph shape only pay for parameter binding. The cache evicts in insertion order.
pub struct ProgramCompiler {
    capacity: usize,
    cache: Mutex<TemplateCache>,
}

impl Default for ProgramCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramCompiler {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero disables caching.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            cache: Mutex::new(TemplateCache::default()),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            hits: cache.hits,
            misses: cache.misses,
            entries: cache.entries.len(),
        }
    }

    fn template(&self, source: &SynthesizedSource) -> Result<Arc<ProgramTemplate>, ProgramError> {
        let key = fingerprint_source(&source.text);
        if self.capacity > 0 {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            let hit = cache
                .entries
                .get(&key)
                .filter(|(text, _)| **text == *source.text)
                .map(|(_, t)| Arc::clone(t));
            if let Some(t) = hit {
                cache.hits += 1;
                return Ok(t);
            }
            cache.misses += 1;
        }

        // Compile outside the lock; concurrent misses on one source only duplicate work.
        let template = Arc::new(ProgramTemplate::compile(&source.text)?);
        tracing::debug!(
            program = %template.name,
            ops = template.pixel.ops.len(),
            "compiled program template"
        );

        if self.capacity > 0 {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if !cache.entries.contains_key(&key) {
                while cache.order.len() >= self.capacity {
                    if let Some(old) = cache.order.pop_front() {
                        cache.entries.remove(&old);
                    }
                }
                cache.order.push_back(key);
            }
            cache
                .entries
                .insert(key, (Arc::clone(&source.text), Arc::clone(&template)));
        }
        Ok(template)
    }
}

impl GraphCompiler for ProgramCompiler {
    fn compile(&self, source: &SynthesizedSource) -> Result<Arc<dyn Renderer>, CompileError> {
        let fail = |e: ProgramError| {
            CompileError::from_program(e, &source.display_name, Arc::clone(&source.text))
        };
        let template = self.template(source).map_err(fail)?;
        if template.channels != source.channel_names.len() {
            return Err(fail(ProgramError::unlocated(
                CompileErrorKind::Instantiation,
                format!(
                    "program declares {} channels but {} are requested",
                    template.channels,
                    source.channel_names.len()
                ),
            )));
        }
        let renderer = instantiate(template, &source.params).map_err(fail)?;
        Ok(Arc::new(renderer))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compiler.rs"]
mod tests;
