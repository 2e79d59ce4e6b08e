// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Generic object-model domains published to the PMU as a group mask.
// Author: Lukas Bower

use boardobj::{
    BoardObj, BoardObjGrp, BoardObjType, TypeMask, BOARDOBJ_TYPE_SUPER, E255_CAPACITY,
    E32_CAPACITY,
};
use log::debug;

use crate::pmu::PmuCommand;

use super::{DomainError, DomainId, DomainModule, SetupContext};

/// Type tag of a generic model object.
pub const MODEL_OBJECT_TYPE: BoardObjType = 1;

/// Placeholder board object standing in for a domain's concrete objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelObject {
    index: usize,
}

impl ModelObject {
    /// Slot the object was created for.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl BoardObj for ModelObject {
    fn obj_type(&self) -> BoardObjType {
        MODEL_OBJECT_TYPE
    }

    fn type_mask(&self) -> TypeMask {
        TypeMask::of(BOARDOBJ_TYPE_SUPER).with(MODEL_OBJECT_TYPE)
    }
}

/// Domain whose model is `count` objects in one group.
#[derive(Debug)]
pub struct ObjectDomain {
    id: DomainId,
    count: usize,
    objects: Option<BoardObjGrp<ModelObject>>,
}

impl ObjectDomain {
    /// Module for `id` that will build `count` objects.
    #[must_use]
    pub fn new(id: DomainId, count: usize) -> Self {
        Self {
            id,
            count,
            objects: None,
        }
    }

    /// Constructed group, once `software_setup` has run.
    #[must_use]
    pub fn objects(&self) -> Option<&BoardObjGrp<ModelObject>> {
        self.objects.as_ref()
    }

    fn capacity(&self) -> usize {
        // VFE variables and equations outgrow the fixed group shape.
        match self.id {
            DomainId::VfeVar | DomainId::VfeEqu => E255_CAPACITY,
            _ => E32_CAPACITY,
        }
    }
}

impl DomainModule for ObjectDomain {
    fn id(&self) -> DomainId {
        self.id
    }

    fn software_setup(&mut self, _ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        let capacity = self.capacity();
        if self.count > capacity {
            return Err(DomainError::Invalid(format!(
                "{} objects exceed group capacity {capacity}",
                self.count
            )));
        }
        let mut objects = BoardObjGrp::construct(capacity)?;
        for index in 0..self.count {
            objects.insert(ModelObject { index }, index)?;
        }
        debug!("{}: {} objects", self.id, objects.len());
        self.objects = Some(objects);
        Ok(())
    }

    fn pmu_setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), DomainError> {
        let objects = self.objects.as_ref().ok_or(DomainError::NotConstructed)?;
        let command = PmuCommand::BoardObjGrpSet {
            domain: self.id,
            mask: objects.mask().clone(),
        };
        ctx.pmu.exchange(&command)?;
        Ok(())
    }

    fn free(&mut self) {
        self.objects = None;
    }
}
