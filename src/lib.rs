//! Indexing and resolution of CSS custom properties and LESS/SCSS variables,
//! with a language server that shows what a variable resolves to under each
//! media or color-scheme context.

pub use crate::{
  arguments::Arguments,
  cache::{ResolutionCache, ScopeKey},
  cancellation::{CancellationToken, Cancelled},
  color::Color,
  context_rank::RankKey,
  doc_comment::DocComment,
  entry::VariableEntry,
  filesystem::{FileSystem, OsFileSystem},
  import_resolver::ImportResolver,
  index_store::{IndexStore, MemoryIndexStore},
  indexer::{IndexKind, Indexer, VariableIndex},
  preprocessor::{PreprocessorResolver, PreprocessorValue},
  project::{Project, Scope},
  resolution::{ContextValue, Resolution, ResolutionInfo},
  resolver::Resolver,
  server::Server,
  settings::{ScopeMode, Settings},
  value::{compare_sizes, convert_to_pixels, is_number, is_size, ValueKind},
};

use {
  crate::{
    cancellation::CancelOnDrop,
    document::Document,
    rope_ext::RopeExt,
    subcommand::Subcommand,
    value::{format_number, split_dimension, unit_to_pixels},
  },
  anyhow::{bail, Context},
  clap::Parser as Clap,
  dashmap::DashMap,
  indexmap::IndexMap,
  once_cell::sync::Lazy,
  parking_lot::{Mutex, RwLock},
  regex::Regex,
  ropey::Rope,
  serde::{Deserialize, Serialize},
  std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashSet, VecDeque},
    fmt::{self, Display, Formatter},
    fs, iter,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
      atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering},
      Arc,
    },
  },
  tower_lsp::{jsonrpc, lsp_types as lsp, LanguageServer, LspService},
};

mod arguments;
mod cache;
mod cancellation;
mod color;
mod context_rank;
mod doc_comment;
mod document;
mod entry;
mod filesystem;
mod import_resolver;
mod index_store;
mod indexer;
mod preprocessor;
mod project;
mod resolution;
mod resolver;
mod rope_ext;
mod server;
mod settings;
mod subcommand;
mod value;

type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
