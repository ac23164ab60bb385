
//! Drives a run the way a host application would: one step per frame,
//! printing the progress, until the distance field is stored.

fn main(){
    let width = 512;
    let height = 512;

    let mask = mask_from_function(width, height, |x, y|{
        // a ring with a square hole punched into its right half
        let x = x as f32 - 256.0;
        let y = y as f32 - 256.0;
        let radius = (x * x + y * y).sqrt();
        let in_hole = x > 60.0 && x < 140.0 && y.abs() < 40.0;
        radius > 80.0 && radius < 200.0 && !in_hole
    });

    generate_in_ticks(mask);
}

fn mask_from_function(width: u32, height: u32, is_inside: impl Fn(u32, u32) -> bool) -> image::GrayImage {
    image::GrayImage::from_fn(width, height, |x, y|{
        image::Luma([if is_inside(x, y) { 0 } else { 255 }])
    })
}

fn generate_in_ticks(mask: image::GrayImage){
    use sequential_distance_field::prelude::*;
    use std::num::NonZeroU32;

    let config = GeneratorConfig {
        spread: 64.0,
        chunk_rows: NonZeroU32::new(64),
        ..GeneratorConfig::default()
    };

    // neither image is readable yet, the run switches them on and back off
    let request = GenerationRequest::new(MemorySource::new(mask, false), MemoryTarget::new(false))
        .with_config(config);

    let mut run: PipelineRun<_, _> = PipelineRun::start(request).unwrap();

    let mut print_progress = |progress: &Progress| {
        println!("{:>20} {:>5.1}%", progress.phase, progress.fraction() * 100.0);
        Control::Continue
    };

    let mut frame = 0;
    loop {
        let status = run.step(&mut print_progress).unwrap();
        frame += 1;

        if status.is_finished() {
            println!("{:?} after {} frames", status, frame);
            break;
        }
    }

    let (source, target) = run.into_images();
    println!("source readable again: {}, toggled {} times", source.is_readable(), source.toggles());

    let png = target.unwrap().stored().unwrap().to_vec();
    std::fs::write("ring_distance.png", png).unwrap();
}
