//! Subdivides a closed cubic B-spline curve three times, evaluates the
//! refined points from factorized stencils and prints them as an OBJ polyline.
use opensubdiv_stencils::{far, Index};

fn main() {
    // Control polygon: a square.
    let vertices = [
        [-0.5, -0.5, 0.0],
        [0.5, -0.5, 0.0],
        [0.5, 0.5, 0.0],
        [-0.5, 0.5, 0.0],
    ];

    let max_level = 3;

    let mut builder =
        far::StencilBuilder::new(vertices.len(), far::StencilBuilderOptions::default());

    // Indices of the vertices of the current level.
    let mut level_vertices = (0..vertices.len() as u32).map(Index).collect::<Vec<_>>();
    let mut next_index = vertices.len() as u32;

    for _ in 0..max_level {
        let n = level_vertices.len();
        let mut refined = Vec::with_capacity(2 * n);

        for i in 0..n {
            let prev = level_vertices[(i + n - 1) % n];
            let curr = level_vertices[i];
            let next = level_vertices[(i + 1) % n];

            // Vertex point.
            builder
                .index(next_index)
                .add_with_weight(prev, 0.125)
                .add_with_weight(curr, 0.75)
                .add_with_weight(next, 0.125);
            refined.push(Index(next_index));
            next_index += 1;

            // Edge point.
            builder
                .index(next_index)
                .add_with_weight(curr, 0.5)
                .add_with_weight(next, 0.5);
            refined.push(Index(next_index));
            next_index += 1;
        }

        level_vertices = refined;
    }

    builder.validate().expect("Stencils are not factorized");

    let stencils = builder.into_stencil_table();

    println!("o subdivision_curve");

    // Every refined point only depends on the four control vertices.
    for &v in &level_vertices {
        let stencil = stencils.stencil(v).unwrap();
        let mut p = [0.0f32; 3];
        for (i, w) in stencil.iter() {
            for (p, c) in p.iter_mut().zip(vertices[usize::from(i)]) {
                *p += w * c;
            }
        }
        println!("v {} {} {}", p[0], p[1], p[2]);
    }

    print!("l");
    for i in 0..=level_vertices.len() {
        print!(" {}", i % level_vertices.len() + 1);
    }
    println!();
}
