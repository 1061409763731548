// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! In-process texture sharing.
//!
//! Clones share one map, so a sender and a receiver built from clones of the
//! same `MemoryTextureShare` see each other. Useful for tests and for
//! running steering and rendering in one process.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::{SharedTextureName, TextureError, TextureFrame, TextureShare};

#[derive(Debug)]
struct Slot {
    width: u32,
    height: u32,
    frame: Option<TextureFrame>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTextureShare {
    slots: Arc<Mutex<HashMap<SharedTextureName, Slot>>>,
}

impl MemoryTextureShare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live senders.
    pub fn sender_count(&self) -> usize {
        self.slots.lock().len()
    }
}

impl TextureShare for MemoryTextureShare {
    fn create_sender(
        &self,
        name: &SharedTextureName,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        self.slots.lock().insert(
            name.clone(),
            Slot {
                width,
                height,
                frame: None,
            },
        );
        Ok(())
    }

    fn update_sender(
        &self,
        name: &SharedTextureName,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| TextureError::UnknownSender(name.label()))?;
        slot.width = width;
        slot.height = height;
        Ok(())
    }

    fn send_texture(
        &self,
        name: &SharedTextureName,
        frame: &TextureFrame,
    ) -> Result<(), TextureError> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| TextureError::UnknownSender(name.label()))?;
        if (frame.width(), frame.height()) != (slot.width, slot.height) {
            return Err(TextureError::InvalidSize {
                width: frame.width(),
                height: frame.height(),
            });
        }
        slot.frame = Some(frame.clone());
        Ok(())
    }

    fn release_sender(&self, name: &SharedTextureName) -> Result<(), TextureError> {
        self.slots.lock().remove(name);
        Ok(())
    }

    fn create_receiver(&self, _name: &SharedTextureName) -> Result<(), TextureError> {
        Ok(())
    }

    fn receive_texture(
        &self,
        name: &SharedTextureName,
    ) -> Result<Option<TextureFrame>, TextureError> {
        Ok(self
            .slots
            .lock()
            .get(name)
            .and_then(|slot| slot.frame.clone()))
    }

    fn release_receiver(&self, _name: &SharedTextureName) -> Result<(), TextureError> {
        Ok(())
    }
}
