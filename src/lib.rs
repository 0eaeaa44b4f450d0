//! # Codemeta Harvester
//!
//! A batch harvester that assembles software metadata records from source
//! repositories.
//!
//! For each configured project the harvester maintains a cached git checkout,
//! scans it for recognized metadata sources (citation files, build manifests,
//! author lists, READMEs, the git history itself), runs a format-specific
//! extractor over each one, and reconciles the partial records into a single
//! final record under a fixed priority order. The final record can be passed
//! through external enrichment services before it is written out.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐
//! │ Checkout │──▶│ Scan │──▶│ Extractors │──▶│ Validate │──▶│ Reconcile │
//! │  (git)   │   │      │   │  (staged)  │   │          │   │  + emit   │
//! └──────────┘   └──────┘   └────────────┘   └──────────┘   └─────┬─────┘
//!                                                                 │
//!                                                           ┌─────▼─────┐
//!                                                           │ Services  │
//!                                                           └───────────┘
//! ```
//!
//! Stages run strictly in sequence; each consumes the completed output of the
//! one before it. Conflicts during reconciliation are settled by source rank
//! alone: a lower rank wins regardless of extraction order.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Project configuration (YAML) |
//! | [`models`] | Core data types |
//! | [`checkout`] | Checkout cache and git plumbing |
//! | [`scan`] | Source presence scanning |
//! | [`extract`] | Extractor contract, registry, staging |
//! | [`validate`] | Partial-record validation |
//! | [`reconcile`] | Priority merge and output |
//! | [`service`] | Post-merge service augmentation |
//! | [`harvest`] | Per-project orchestration |
//! | [`error`] | Error taxonomy |
//! | [`logging`] | Per-project harvest log |

pub mod checkout;
pub mod config;
pub mod error;
pub mod extract;
pub mod extractor_authors;
pub mod extractor_cff;
pub mod extractor_docs;
pub mod extractor_git;
pub mod extractor_manifest;
pub mod extractor_record;
pub mod harvest;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod scan;
pub mod service;
pub mod validate;
