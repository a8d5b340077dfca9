//! Resource management

use crate::error::SwotVisError;

use tokio::sync::{Semaphore, SemaphorePermit};

/// [crate::resource_manager::ResourceManager] provides a simple way to allocate various resources
/// to tasks. Resource management is performed using a Tokio Semaphore for each type of resource.
#[derive(Debug)]
pub struct ResourceManager {
    /// Optional semaphore for HydroCron connections.
    hydrocron_connections: Option<Semaphore>,

    /// Optional semaphore for computation tasks.
    tasks: Option<Semaphore>,
}

impl ResourceManager {
    /// Returns a new ResourceManager object.
    pub fn new(hydrocron_connection_limit: Option<usize>, task_limit: Option<usize>) -> Self {
        Self {
            hydrocron_connections: hydrocron_connection_limit.map(Semaphore::new),
            tasks: task_limit.map(Semaphore::new),
        }
    }

    /// Acquire a HydroCron connection resource.
    pub async fn hydrocron_connection(&self) -> Result<Option<SemaphorePermit>, SwotVisError> {
        optional_acquire(&self.hydrocron_connections, 1).await
    }

    /// Acquire a task resource.
    pub async fn task(&self) -> Result<Option<SemaphorePermit>, SwotVisError> {
        optional_acquire(&self.tasks, 1).await
    }
}

/// Acquire permits on an optional Semaphore, if present.
async fn optional_acquire(
    sem: &Option<Semaphore>,
    n: usize,
) -> Result<Option<SemaphorePermit>, SwotVisError> {
    let n = n.try_into()?;
    if let Some(sem) = sem {
        sem.acquire_many(n)
            .await
            .map(Some)
            .map_err(|err| err.into())
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::TryAcquireError;

    #[tokio::test]
    async fn no_resource_management() {
        let rm = ResourceManager::new(None, None);
        assert!(rm.hydrocron_connections.is_none());
        assert!(rm.tasks.is_none());
        let _c = rm.hydrocron_connection().await.unwrap();
        let _t = rm.task().await.unwrap();
        assert!(_c.is_none());
        assert!(_t.is_none());
    }

    #[tokio::test]
    async fn full_resource_management() {
        let rm = ResourceManager::new(Some(1), Some(1));
        assert!(rm.hydrocron_connections.is_some());
        assert!(rm.tasks.is_some());
        let _c = rm.hydrocron_connection().await.unwrap();
        let _t = rm.task().await.unwrap();
        assert!(_c.is_some());
        assert!(_t.is_some());
        // Check that there are no more resources (without blocking).
        assert_eq!(
            rm.hydrocron_connections.as_ref().unwrap().try_acquire().err(),
            Some(TryAcquireError::NoPermits)
        );
        assert_eq!(
            rm.tasks.as_ref().unwrap().try_acquire().err(),
            Some(TryAcquireError::NoPermits)
        );
    }

    #[tokio::test]
    async fn permits_released_on_drop() {
        let rm = ResourceManager::new(Some(1), None);
        {
            let _c = rm.hydrocron_connection().await.unwrap();
        }
        let _c = rm.hydrocron_connection().await.unwrap();
        assert!(_c.is_some());
    }
}
