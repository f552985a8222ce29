//! Ambient clustered network that slowly grows, rewires and sheds nodes
//! behind the page.
//!
//! Everything below `scene` is plain simulation code and runs natively;
//! `scene` and `component` are the browser edge.

mod buffers;
mod builder;
mod component;
mod config;
mod graph;
mod lifecycle;
mod palette;
mod physics;
mod render;
mod rng;
mod scene;
mod state;
mod types;

pub use buffers::{ALPHA_EPSILON, FrameBuffers, LayerBuffer, PointVertex, SegmentVertex, SyncStats};
pub use component::LivingNetwork;
pub use config::{BridgeSpec, ClusterSpec, DriverConfig, LifecycleConfig, PhysicsConfig, SceneConfig};
pub use graph::Graph;
pub use lifecycle::{ClusterPicker, LifecycleReport, Policies, VictimPicker, inverse_population, oldest_biased};
pub use palette::{Palette, Rgb, Theme};
pub use render::{Camera, CanvasSink, DrawSink, Projected};
pub use rng::SceneRng;
pub use scene::{SceneHandle, destroy_all, init};
pub use state::{FrameReport, NetworkState};
pub use types::{BufferSlot, Cluster, Edge, EdgeId, Fade, Layer, Node, NodeId, NodeKind};
