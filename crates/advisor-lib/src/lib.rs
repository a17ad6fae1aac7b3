//! Placement advisor library
//!
//! This crate provides the core functionality for:
//! - Signal normalization and confidence scoring
//! - Signal collection with caching, deduplication and bounded retries
//! - Candidate region resolution and per-region SKU evaluation
//! - Deployment strategy selection and allocation building
//! - Capacity and deployment planners
//! - Health checks and observability

pub mod cloud;
pub mod collector;
pub mod error;
pub mod evaluator;
pub mod health;
pub mod models;
pub mod observability;
pub mod planner;
pub mod scoring;
pub mod strategy;
pub mod workload;

pub use cloud::{CloudApi, StaticCatalog};
pub use collector::{CollectorConfig, RefreshWorker, SignalCollector, SignalRequest};
pub use error::{AdvisorError, AdvisorResult, CloudApiError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use planner::{
    CapacityPlanner, CapacityStrategyResponse, DeploymentAdvisor, DeploymentPlanResponse,
    PlannerConfig,
};
pub use strategy::StrategyType;
pub use workload::{DeploymentIntent, WorkloadProfile};
