//! Host-side scene contracts: camera views and selectable objects.

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Quaternion, Vec3};

/// Snapshot of one viewport's camera at the instant of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    /// Point the camera orbits / looks at.
    pub look_at: Vec3,
    /// World-to-camera transform. Assumed rigid (no scale or shear).
    pub view_matrix: Mat4,
    /// Camera orientation.
    pub rotation: Quaternion,
}

impl CameraView {
    /// Camera at `position` looking at `look_at` with orientation `rotation`.
    pub fn new(position: Vec3, look_at: Vec3, rotation: Quaternion) -> Self {
        Self {
            look_at,
            view_matrix: Mat4::view_from_camera(position, rotation),
            rotation,
        }
    }
}

/// A host object that can be moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub location: Vec3,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, location: Vec3) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// What the tracking pipeline needs from the host application.
pub trait SceneHost {
    /// Active camera views in host order.
    fn camera_views(&self) -> Vec<CameraView>;

    /// The current target selection. Always a sequence, possibly empty.
    fn selection(&mut self) -> Vec<&mut SceneObject>;
}

/// In-memory scene used by the reference shell and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    /// Names of selected objects.
    pub selected: Vec<String>,
    pub views: Vec<CameraView>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and return its index.
    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Mark an object as selected by name. Unknown names are ignored.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.objects.iter().any(|o| o.name == name) {
            return false;
        }
        if !self.selected.iter().any(|s| s == name) {
            self.selected.push(name.to_string());
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn add_view(&mut self, view: CameraView) {
        self.views.push(view);
    }

    /// Look up an object by name.
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

impl SceneHost for Scene {
    fn camera_views(&self) -> Vec<CameraView> {
        self.views.clone()
    }

    fn selection(&mut self) -> Vec<&mut SceneObject> {
        let selected = &self.selected;
        self.objects
            .iter_mut()
            .filter(|o| selected.iter().any(|s| *s == o.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_only_yields_selected_objects() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new("Cube", Vec3::ZERO));
        scene.add_object(SceneObject::new("Lamp", Vec3::ZERO));
        assert!(scene.select("Cube"));
        assert!(!scene.select("Missing"));

        let selection = scene.selection();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].name, "Cube");
    }

    #[test]
    fn test_selection_is_mutable() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new("Cube", Vec3::ZERO));
        scene.select("Cube");
        for object in scene.selection() {
            object.location = Vec3::new(1.0, 2.0, 3.0);
        }
        assert_eq!(
            scene.object("Cube").unwrap().location,
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_selecting_twice_does_not_duplicate() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new("Cube", Vec3::ZERO));
        scene.select("Cube");
        scene.select("Cube");
        assert_eq!(scene.selected.len(), 1);
        scene.clear_selection();
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn test_camera_view_keeps_host_order() {
        let mut scene = Scene::new();
        scene.add_view(CameraView::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Quaternion::IDENTITY,
        ));
        scene.add_view(CameraView::new(
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::ZERO,
            Quaternion::IDENTITY,
        ));
        let views = scene.camera_views();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].view_matrix.translation(), Vec3::new(0.0, 0.0, -10.0));
    }
}
