//! Makefile template for building and shipping notebook images through ECR.

const TEMPLATE: &str = r"
SHELL = /bin/bash
IMAGE = {image}
TAG ?= dev
REGION = $(shell aws configure get region)
AWS_ACCOUNT_ID = $(shell aws sts get-caller-identity --query Account --output text)
REPO = {repo}

build:
	DOCKER_BUILDKIT=1 && export DOCKER_BUILDKIT
	docker build -f Dockerfile -t $(IMAGE):$(TAG) .

run:
	@docker run --rm -it -v .:/home/eki/local_folder --platform linux/amd64 $(IMAGE):$(TAG)

run_aws: build
	@docker run --rm -it -v /home/ubuntu/efs:/home/eki/efs --platform linux/amd64 $(IMAGE):$(TAG)

push_aws: check-tag
	aws ecr get-login-password --region $(REGION) | docker login --username AWS --password-stdin $(AWS_ACCOUNT_ID).dkr.ecr.$(REGION).amazonaws.com
	docker tag $(REPO):$(TAG) $(AWS_ACCOUNT_ID).dkr.ecr.$(REGION).amazonaws.com/$(REPO):$(TAG)
	docker push  $(AWS_ACCOUNT_ID).dkr.ecr.$(REGION).amazonaws.com/$(REPO):$(TAG)

pull_aws: check-tag
	aws ecr get-login-password --region $(REGION) | docker login --username AWS --password-stdin $(AWS_ACCOUNT_ID).dkr.ecr.$(REGION).amazonaws.com
	docker pull  $(AWS_ACCOUNT_ID).dkr.ecr.$(REGION).amazonaws.com/$(REPO):$(TAG)
	docker tag $(AWS_ACCOUNT_ID).dkr.ecr.$(REGION).amazonaws.com/$(REPO):$(TAG) $(REPO):$(TAG)

jupyter-lab:
	@docker run --rm -it -v .:/home/eki -p 8888:8888 -p 8889:8889 -u 0 $(REPO):$(TAG) jupyter-lab --no-browser --ip=0.0.0.0 --allow-root

.PHONY:	build run run_aws push_aws pull_aws jupyter-lab check-tag

check-tag:
ifndef TAG
	$(error TAG needs to be set)
endif
";

/// Render the Makefile for `image` built locally and pushed to ECR repository `repo`.
#[must_use]
pub fn render_makefile(image: &str, repo: &str) -> String {
    TEMPLATE.replace("{image}", image).replace("{repo}", repo)
}
