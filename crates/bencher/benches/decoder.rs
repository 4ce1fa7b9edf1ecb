use std::hint::black_box;
use bencher::{TestCase, TestFile, TestGroup};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_proxy::codec::{RequestDecoder, ResponseDecoder};
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

static SMALL_HEADER: TestFile = TestFile::new("get_small.txt", include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: TestFile = TestFile::new("get_large.txt", include_str!("../resources/request/get_large.txt"));
static POST_BODY: TestFile = TestFile::new("post_body.txt", include_str!("../resources/request/post_body.txt"));
static OK_RESPONSE: TestFile = TestFile::new("ok_length.txt", include_str!("../resources/response/ok_length.txt"));

fn request_cases() -> Vec<TestCase> {
    vec![
        TestCase::head_only("get", TestGroup::Small, SMALL_HEADER),
        TestCase::head_only("get", TestGroup::Large, LARGE_HEADER),
        // head, one body chunk, end of body
        TestCase::new("post", TestGroup::Normal, POST_BODY, 3),
    ]
}

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_decoder");

    for case in request_cases() {
        group.throughput(Throughput::Bytes(case.file().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.id()), &case, |b, case| {
            b.iter_batched_ref(
                || (RequestDecoder::new(), BytesMut::from(case.file().content())),
                |(request_decoder, bytes_mut)| {
                    for _ in 0..case.items() {
                        let item = request_decoder.decode(bytes_mut).expect("input should be a valid proxy request").unwrap();
                        black_box(item);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_response_decoder(criterion: &mut Criterion) {
    // status line, 7 header lines, blank line, one body chunk, end of body
    let case = TestCase::new("ok_length", TestGroup::Normal, OK_RESPONSE, 11);
    let mut group = criterion.benchmark_group("response_decoder");

    group.throughput(Throughput::Bytes(case.file().len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(case.id()), &case, |b, case| {
        b.iter_batched_ref(
            || (ResponseDecoder::new(false), BytesMut::from(case.file().content())),
            |(response_decoder, bytes_mut)| {
                for _ in 0..case.items() {
                    let item = response_decoder.decode(bytes_mut).expect("input should be a valid response").unwrap();
                    black_box(item);
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(decoder, benchmark_request_decoder, benchmark_response_decoder);
criterion_main!(decoder);
