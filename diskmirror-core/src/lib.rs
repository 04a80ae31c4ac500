mod client;

pub use client::{
    DiskClient, DiskError, Resource, ResourceList, ResourceType, TransferLink, is_success_status,
};
