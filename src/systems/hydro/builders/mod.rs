// primitive assembly builders
// one strategy per component kind, each turns a layout into descriptors and clips

use bevy::prelude::*;

use super::animation::{make_clip, FrameSpan, MotionClip, MotionKind};
use super::layout::LayoutPlan;
use super::primitive::{MaterialPalette, MaterialRole, Placement, PrimitiveDescriptor, PrimitiveId, Shape};

pub mod generator;
pub mod intake;
pub mod turbine;

/// Requested and emitted size of one repeated group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSummary {
    pub name: &'static str,
    pub requested: i64,
    pub emitted: usize,
}

impl GroupSummary {
    pub fn is_skipped(&self) -> bool {
        self.emitted == 0
    }
}

/// Output of one builder run. Primitives are append-only, their index is their id.
#[derive(Clone, Debug, Default)]
pub struct Assembly {
    pub primitives: Vec<PrimitiveDescriptor>,
    pub clips: Vec<MotionClip>,
    pub groups: Vec<GroupSummary>,
    palette: MaterialPalette,
}

impl Assembly {
    pub fn new(palette: &MaterialPalette) -> Self {
        Self { palette: palette.clone(), ..default() }
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        group: &'static str,
        shape: Shape,
        placement: Placement,
        material: MaterialRole,
    ) -> PrimitiveId {
        let id = PrimitiveId(self.primitives.len());
        self.primitives.push(PrimitiveDescriptor {
            name: name.into(),
            group,
            shape,
            placement,
            material: self.palette.tag(material),
            parent: None,
        });
        id
    }

    /// Links `child` under `parent`. The parent may be pushed later than the child.
    pub fn attach(&mut self, child: PrimitiveId, parent: PrimitiveId) {
        if let Some(descriptor) = self.primitives.get_mut(child.0) {
            descriptor.parent = Some(parent);
        }
    }

    /// Adds a cyclic clip starting from the target's current placement.
    pub fn animate(&mut self, target: PrimitiveId, kind: MotionKind, span: FrameSpan) {
        let Some(descriptor) = self.primitives.get(target.0) else {
            warn!("no primitive {:?} to animate", target);
            return;
        };
        self.clips.push(make_clip(target, descriptor.placement, kind, span));
    }

    /// Records a repeated group once it has been emitted (or skipped).
    pub fn record_group(&mut self, name: &'static str, requested: i64, emitted: usize) {
        if emitted == 0 {
            warn!("group `{}` skipped, requested count {}", name, requested);
        }
        self.groups.push(GroupSummary { name, requested, emitted });
    }

    pub fn group(&self, name: &str) -> impl Iterator<Item = &PrimitiveDescriptor> {
        self.primitives.iter().filter(move |p| p.group == name)
    }

    pub fn summary(&self, name: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// True when every parent index is in range and following parents never loops.
pub fn parents_form_forest(primitives: &[PrimitiveDescriptor]) -> bool {
    for start in 0..primitives.len() {
        let mut current = start;
        let mut steps = 0;
        while let Some(parent) = primitives[current].parent {
            if parent.0 >= primitives.len() {
                return false;
            }
            current = parent.0;
            steps += 1;
            if steps > primitives.len() {
                return false;
            }
        }
    }
    true
}

pub fn build(plan: &LayoutPlan, palette: &MaterialPalette) -> Assembly {
    let assembly = match plan {
        LayoutPlan::Generator(layout) => generator::build(layout, palette),
        LayoutPlan::Turbine(layout) => turbine::build(layout, palette),
        LayoutPlan::Intake(layout) => intake::build(layout, palette),
    };
    debug!(
        "{} assembly: {} primitives, {} clips",
        plan.kind(),
        assembly.primitives.len(),
        assembly.clips.len()
    );
    assembly
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(assembly: &mut Assembly, name: &str) -> PrimitiveId {
        assembly.push(
            name.to_string(),
            "test",
            Shape::Box { size: Vec3::ONE },
            Placement::default(),
            MaterialRole::Concrete,
        )
    }

    #[test]
    fn ids_follow_push_order() {
        let mut assembly = Assembly::new(&MaterialPalette::default());
        assert_eq!(cube(&mut assembly, "a"), PrimitiveId(0));
        assert_eq!(cube(&mut assembly, "b"), PrimitiveId(1));
    }

    #[test]
    fn parent_may_come_after_child() {
        let mut assembly = Assembly::new(&MaterialPalette::default());
        let child = cube(&mut assembly, "child");
        let parent = cube(&mut assembly, "parent");
        assembly.attach(child, parent);
        assert!(parents_form_forest(&assembly.primitives));
    }

    #[test]
    fn cycles_are_detected() {
        let mut assembly = Assembly::new(&MaterialPalette::default());
        let a = cube(&mut assembly, "a");
        let b = cube(&mut assembly, "b");
        assembly.attach(a, b);
        assembly.attach(b, a);
        assert!(!parents_form_forest(&assembly.primitives));
    }

    #[test]
    fn material_falls_back_through_the_palette() {
        let palette = MaterialPalette::empty()
            .with(MaterialRole::Steel, crate::systems::hydro::primitive::MaterialSpec::new([0.5; 4]));
        let mut assembly = Assembly::new(&palette);
        let id = assembly.push("rope", "crane", Shape::Box { size: Vec3::ONE }, Placement::default(), MaterialRole::Crane);
        assert_eq!(assembly.primitives[id.0].material, MaterialRole::Steel);
    }
}
