// saves the generated component as an obj file
// by iterating through all the primitive meshes, baked into world space

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use bevy::render::mesh::{Indices, VertexAttributeValues};

use crate::error::ExportError;
use crate::systems::hydro::bevy_host::HydroPrimitive;

// export event
#[derive(Event)]
pub struct ExportEvent {
    pub path: PathBuf,
}

// outcome, picked up by the ui toast
#[derive(Event, Clone, Debug)]
pub struct ExportFinished {
    pub result: Result<(PathBuf, usize), String>,
}

/// Where the viewer writes the obj for a component.
pub fn obj_path(folder: &Path, stem: &str) -> PathBuf {
    folder.join(format!("{}.obj", stem))
}

fn write_faces<W: Write>(writer: &mut W, indices: &Indices, vertex_offset: u32) -> std::io::Result<()> {
    let triangles: Vec<u32> = match indices {
        Indices::U16(indices) => indices.iter().map(|&i| i as u32).collect(),
        Indices::U32(indices) => indices.clone(),
    };
    // obj indices start at 1
    for chunk in triangles.chunks_exact(3) {
        writeln!(
            writer,
            "f {} {} {}",
            vertex_offset + chunk[0],
            vertex_offset + chunk[1],
            vertex_offset + chunk[2]
        )?;
    }
    Ok(())
}

/// Writes one object per mesh, vertices transformed to world space.
/// Returns the number of objects written.
pub fn write_obj<'a, W: Write>(
    writer: &mut W,
    objects: impl IntoIterator<Item = (&'a str, &'a Mesh, &'a GlobalTransform)>,
) -> std::io::Result<usize> {
    writeln!(writer, "# hydro_gen component export")?;
    writeln!(writer, "# units: meters, Y up")?;

    let mut vertex_offset = 1;
    let mut count = 0;

    for (name, mesh, transform) in objects {
        let Some(VertexAttributeValues::Float32x3(vertices)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION) else {
            continue;
        };

        writeln!(writer, "o {}", name)?;
        for vertex in vertices {
            let v = transform.transform_point(Vec3::from_array(*vertex));
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        if let Some(indices) = mesh.indices() {
            write_faces(writer, indices, vertex_offset)?;
        }

        vertex_offset += vertices.len() as u32;
        writeln!(writer)?;
        count += 1;
    }

    Ok(count)
}

// export all primitive entities in scene
pub fn export_obj(
    meshes: &Assets<Mesh>,
    primitives: &Query<(&Mesh3d, &GlobalTransform, &Name, &HydroPrimitive)>,
    path: &Path,
) -> Result<usize, ExportError> {
    let io_error = |source| ExportError::Io { path: path.to_path_buf(), source };

    if let Some(folder) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(folder).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);

    // creation order, so repeated exports produce identical files
    let mut objects: Vec<_> = primitives.iter()
        .filter_map(|(mesh3d, transform, name, id)| {
            meshes.get(&mesh3d.0).map(|mesh| (id.0, name.as_str(), mesh, transform))
        })
        .collect();
    objects.sort_by_key(|(id, ..)| *id);

    let count = write_obj(&mut writer, objects.into_iter().map(|(_, name, mesh, transform)| (name, mesh, transform)))
        .map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    Ok(count)
}

// handle export events
pub fn handle_export(
    mut events: EventReader<ExportEvent>,
    mut finished: EventWriter<ExportFinished>,
    meshes: Res<Assets<Mesh>>,
    primitives: Query<(&Mesh3d, &GlobalTransform, &Name, &HydroPrimitive)>,
) {
    for event in events.read() {
        let result = match export_obj(&meshes, &primitives, &event.path) {
            Ok(count) => {
                info!("exported {} meshes to {:?}", count, event.path);
                Ok((event.path.clone(), count))
            }
            Err(e) => {
                error!("export failed: {}", e);
                Err(e.to_string())
            }
        };
        finished.write(ExportFinished { result });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_are_written_in_world_space_with_offset_faces() {
        let cube: Mesh = Cuboid::new(2.0, 2.0, 2.0).into();
        let vertex_count = match cube.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(v)) => v.len(),
            _ => panic!("cuboid without positions"),
        };
        let near = GlobalTransform::IDENTITY;
        let far = GlobalTransform::from_xyz(100.0, 0.0, 0.0);

        let mut out = Vec::new();
        let count = write_obj(&mut out, [("Pier_0", &cube, &near), ("Pier_1", &cube, &far)]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(count, 2);
        assert!(text.lines().all(|l| l.is_empty() || l.starts_with(['#', 'o', 'v', 'f'])));
        assert!(text.contains("o Pier_1"));
        assert!(text.lines().filter(|l| l.starts_with("v ")).any(|l| l.starts_with("v 101")));

        // faces of the second object index past the first object's vertices
        let second: Vec<u32> = text.split("o Pier_1").nth(1).unwrap().lines()
            .filter(|l| l.starts_with("f "))
            .flat_map(|l| l[2..].split(' ').map(|i| i.parse::<u32>().unwrap()).collect::<Vec<_>>())
            .collect();
        assert!(second.iter().all(|&i| i > vertex_count as u32));
    }

    #[test]
    fn obj_path_uses_the_component_name() {
        assert_eq!(obj_path(Path::new("out"), "turbine"), PathBuf::from("out/turbine.obj"));
    }
}
